// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the admittance trajectory plan and everything it needs per tick.
pub mod admittance_plan;
pub mod bushing;
pub mod command;
pub mod control_loop;
pub mod control_tools;
pub mod frames;
pub mod measurements;
pub mod parameters;
