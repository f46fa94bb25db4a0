// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Locking, versioning, observation and access control are not offered.

use crate::connection::ContentStore;
use crate::error::{Error, Result};

impl ContentStore {
    pub fn lock_node(&mut self, _path: &str, _deep: bool) -> Result<()> {
        Err(Error::NotImplemented("node locking"))
    }

    pub fn checkin_node(&mut self, _path: &str) -> Result<()> {
        Err(Error::NotImplemented("versioning"))
    }

    pub fn journal_events(&self, _since: i64) -> Result<()> {
        Err(Error::NotImplemented("observation journal"))
    }

    pub fn set_access_control(&mut self, _path: &str, _policy: &str) -> Result<()> {
        Err(Error::NotImplemented("access control"))
    }
}
