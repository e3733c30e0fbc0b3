use std::collections::BTreeMap;

use serde::Serialize;

use crate::codec::Dimensions;

/// Texture decision. `new_size` is only set when resizing is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageAnalysis {
    pub needs_conversion: bool,
    pub needs_resizing: bool,
    pub old_size: Dimensions,
    pub new_size: Option<Dimensions>,
}

impl ImageAnalysis {
    pub fn needs_action(&self) -> bool {
        self.needs_conversion || self.needs_resizing
    }
}

/// Sound decision. `new_bitrate` is only set when bitrate processing is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioAnalysis {
    pub needs_conversion: bool,
    pub needs_bitrate_processing: bool,
    pub old_bitrate: u32,
    pub new_bitrate: Option<u32>,
}

impl AudioAnalysis {
    pub fn needs_action(&self) -> bool {
        self.needs_conversion || self.needs_bitrate_processing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnalysisResult {
    Image(ImageAnalysis),
    Audio(AudioAnalysis),
}

impl AnalysisResult {
    pub fn needs_action(&self) -> bool {
        match self {
            AnalysisResult::Image(r) => r.needs_action(),
            AnalysisResult::Audio(r) => r.needs_action(),
        }
    }
}

/// Analysis results keyed by package index, iterated in index order.
///
/// Analysis visits the package in index order, so iteration order is also
/// analysis order.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    entries: BTreeMap<usize, AnalysisResult>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize, result: AnalysisResult) {
        self.entries.insert(index, result);
    }

    pub fn get(&self, index: usize) -> Option<&AnalysisResult> {
        self.entries.get(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &AnalysisResult)> {
        self.entries.iter().map(|(i, r)| (*i, r))
    }

    /// Entries that need a transformation.
    pub fn actionable(&self) -> impl Iterator<Item = (usize, &AnalysisResult)> {
        self.iter().filter(|(_, r)| r.needs_action())
    }

    pub fn action_count(&self) -> usize {
        self.actionable().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(conv: bool, resize: bool) -> AnalysisResult {
        AnalysisResult::Image(ImageAnalysis {
            needs_conversion: conv,
            needs_resizing: resize,
            old_size: Dimensions::new(64, 64),
            new_size: resize.then(|| Dimensions::square(128)),
        })
    }

    #[test]
    fn test_needs_action_is_any_flag() {
        assert!(!image(false, false).needs_action());
        assert!(image(true, false).needs_action());
        assert!(image(false, true).needs_action());

        let audio = AnalysisResult::Audio(AudioAnalysis {
            needs_conversion: false,
            needs_bitrate_processing: true,
            old_bitrate: 192_000,
            new_bitrate: Some(128_000),
        });
        assert!(audio.needs_action());
    }

    #[test]
    fn test_actionable_in_index_order() {
        let mut set = ResultSet::new();
        set.insert(5, image(true, false));
        set.insert(1, image(false, false));
        set.insert(3, image(false, true));

        let idx: Vec<usize> = set.actionable().map(|(i, _)| i).collect();
        assert_eq!(idx, vec![3, 5]);
        assert_eq!(set.action_count(), 2);
        assert_eq!(set.len(), 3);
    }
}
