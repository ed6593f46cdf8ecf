//! Command tags.

/// Hands out `A0001`, `A0002`, ... for successive commands.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    issued: u32,
    prefix: char,
}

impl TagGenerator {
    /// Tags will start with `prefix`.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { issued: 0, prefix }
    }

    /// The next tag.
    ///
    /// Wraps after `u32::MAX`. Tags only need to differ from the commands
    /// still in flight, and this client sends one at a time.
    pub fn next_tag(&mut self) -> String {
        self.issued = self.issued.wrapping_add(1);
        format!("{}{:04}", self.prefix, self.issued)
    }

    /// How many tags have been handed out.
    #[must_use]
    pub const fn issued(&self) -> u32 {
        self.issued
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('A')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one() {
        let mut tags = TagGenerator::default();
        assert_eq!(tags.next_tag(), "A0001");
        assert_eq!(tags.next_tag(), "A0002");
        assert_eq!(tags.issued(), 2);
    }

    #[test]
    fn prefix_is_kept() {
        let mut tags = TagGenerator::new('M');
        assert_eq!(tags.next_tag(), "M0001");
    }

    #[test]
    fn grows_past_four_digits() {
        let mut tags = TagGenerator {
            issued: 12_344,
            prefix: 'A',
        };
        assert_eq!(tags.next_tag(), "A12345");
    }
}
