// SPDX-License-Identifier: AGPL-3.0
// Feature App Core - Counter state

/// Session-scoped counter shown on the counter page. Not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    value: i64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn increment(&mut self) -> i64 {
        self.value = self.value.saturating_add(1);
        self.value
    }

    pub fn decrement(&mut self) -> i64 {
        self.value = self.value.saturating_sub(1);
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }
}
