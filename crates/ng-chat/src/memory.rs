//! Rolling interaction memory

use std::collections::VecDeque;

const SEPARATOR: &str = " | ";

/// Bounded log of short interaction snippets.
///
/// Trimmed from the oldest end whenever the item count or the joined
/// character length exceeds its bound. Advisory context only.
#[derive(Debug, Clone)]
pub struct InteractionMemory {
    items: VecDeque<String>,
    max_items: usize,
    max_chars: usize,
}

impl InteractionMemory {
    pub fn new(max_items: usize, max_chars: usize) -> Self {
        Self {
            items: VecDeque::new(),
            max_items,
            max_chars,
        }
    }

    pub fn remember(&mut self, interaction: impl AsRef<str>) {
        let item = interaction.as_ref().trim();
        if item.is_empty() {
            return;
        }
        self.items.push_back(item.to_string());
        while self.items.len() > self.max_items {
            self.items.pop_front();
        }
        while !self.items.is_empty() && self.joined_chars() > self.max_chars {
            self.items.pop_front();
        }
    }

    /// Everything remembered, oldest first, joined with ` | `
    pub fn recall(&self) -> String {
        self.items
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn joined_chars(&self) -> usize {
        let text: usize = self.items.iter().map(|s| s.chars().count()).sum();
        text + SEPARATOR.len() * self.items.len().saturating_sub(1)
    }
}

impl Default for InteractionMemory {
    fn default() -> Self {
        Self::new(
            ng_core::config::DEFAULT_MEMORY_MAX_ITEMS,
            ng_core::config::DEFAULT_MEMORY_MAX_CHARS,
        )
    }
}
