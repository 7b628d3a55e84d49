//! Six-box keypad buffer for typing a code.

use super::challenge::OTP_LENGTH;

/// One digit per box. Non-digit input is ignored; pasting fills boxes from
/// the cursor onward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpEntry {
    slots: Vec<Option<char>>,
}

impl Default for OtpEntry {
    fn default() -> Self {
        Self::new(OTP_LENGTH)
    }
}

impl OtpEntry {
    pub fn new(length: usize) -> Self {
        Self {
            slots: vec![None; length],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Handle input into box `index`. Returns the box that should take focus
    /// next, or `None` if the input was rejected.
    pub fn input(&mut self, index: usize, text: &str) -> Option<usize> {
        if index >= self.slots.len() || !text.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let mut digits = text.chars();
        match (digits.next(), digits.next()) {
            (None, _) => {
                self.slots[index] = None;
                Some(index)
            }
            (Some(d), None) => {
                self.slots[index] = Some(d);
                Some((index + 1).min(self.slots.len() - 1))
            }
            _ => self.paste(index, text),
        }
    }

    /// Fill boxes starting at `index`; digits past the last box are dropped.
    pub fn paste(&mut self, index: usize, text: &str) -> Option<usize> {
        if index >= self.slots.len() || !text.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let mut filled = 0;
        for (slot, digit) in self.slots[index..].iter_mut().zip(text.chars()) {
            *slot = Some(digit);
            filled += 1;
        }
        Some((index + filled).min(self.slots.len() - 1))
    }

    /// Backspace in box `index`: an empty box clears and focuses the
    /// previous one.
    pub fn backspace(&mut self, index: usize) -> usize {
        if index >= self.slots.len() {
            return index;
        }
        if self.slots[index].is_none() && index > 0 {
            self.slots[index - 1] = None;
            return index - 1;
        }
        self.slots[index] = None;
        index
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    /// Concatenated digits; empty boxes are skipped.
    pub fn value(&self) -> String {
        self.slots.iter().flatten().collect()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }
}
