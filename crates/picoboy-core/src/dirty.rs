use crate::hardware::LCD_HEIGHT;

/// Per-scanline record of the last checksum actually sent to the panel.
///
/// Owned by the emulation core; nothing else reads or writes it. Every row
/// starts out as "never sent", so the first frame forwards every line no
/// matter what it hashes to.
#[derive(Clone, Debug)]
pub struct DirtyLineFilter {
    sent: [Option<u32>; LCD_HEIGHT],
}

impl Default for DirtyLineFilter {
    fn default() -> Self {
        Self {
            sent: [None; LCD_HEIGHT],
        }
    }
}

impl DirtyLineFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides whether scanline `row` with checksum `hash` must be sent.
    ///
    /// Returns `false` and leaves the table alone when `hash` matches the
    /// last value sent for `row`. Otherwise records `hash` and returns `true`.
    /// Rows outside the picture are never forwarded.
    pub fn should_forward(&mut self, row: usize, hash: u32) -> bool {
        let Some(slot) = self.sent.get_mut(row) else {
            return false;
        };
        if *slot == Some(hash) {
            return false;
        }
        *slot = Some(hash);
        true
    }

    /// Last checksum sent for `row`, if any.
    pub fn sent_hash(&self, row: usize) -> Option<u32> {
        self.sent.get(row).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_hash_is_forwarded_on_first_sight() {
        let mut filter = DirtyLineFilter::new();
        assert!(filter.should_forward(0, 0));
        assert!(!filter.should_forward(0, 0));
    }

    #[test]
    fn rows_are_tracked_independently() {
        let mut filter = DirtyLineFilter::new();
        assert!(filter.should_forward(3, 0xAAAA));
        assert!(filter.should_forward(4, 0xAAAA));
        assert_eq!(filter.sent_hash(3), Some(0xAAAA));
        assert_eq!(filter.sent_hash(5), None);
    }

    #[test]
    fn out_of_range_row_is_suppressed() {
        let mut filter = DirtyLineFilter::new();
        assert!(!filter.should_forward(LCD_HEIGHT, 1));
        assert_eq!(filter.sent_hash(LCD_HEIGHT), None);
    }
}
