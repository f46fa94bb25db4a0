// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Provisioning of the arbor schema from the command line.

pub mod config;
pub mod error;
pub mod provision;
