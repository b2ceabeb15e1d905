// SPDX-License-Identifier: GPL-3.0-only

use stage1_types::Stage1Config;

use crate::Result;

pub trait Stage1Store: Send + Sync {
    fn load(&self) -> Result<Stage1Config>;

    fn save(&self, config: &Stage1Config) -> Result<()>;
}
