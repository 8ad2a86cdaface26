//! Static allow-list of face-capable hardware models.
//!
//! Older platform versions cannot report the biometry type dynamically,
//! so face hardware is recognised by model identifier instead. Only
//! consulted when the dynamic query is inconclusive.

const FACE_CAPABLE_MODELS: &[&str] = &[
    "iPhone10,3",
    "iPhone10,6",
    "iPhone11,2",
    "iPhone11,4",
    "iPhone11,6",
    "iPhone11,8",
    "iPhone12,1",
    "iPhone12,3",
    "iPhone12,5",
    "iPad8,1",
    "iPad8,2",
    "iPad8,3",
    "iPad8,4",
    "iPad8,5",
    "iPad8,6",
    "iPad8,7",
    "iPad8,8",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceModelList {
    extra: Vec<String>,
}

impl FaceModelList {
    /// The built-in list only.
    pub fn builtin() -> Self {
        Self { extra: Vec::new() }
    }

    /// The built-in list plus `extra` model identifiers.
    pub fn with_extra(extra: Vec<String>) -> Self {
        Self { extra }
    }

    pub fn contains(&self, model: &str) -> bool {
        FACE_CAPABLE_MODELS.contains(&model) || self.extra.iter().any(|m| m == model)
    }
}

impl Default for FaceModelList {
    fn default() -> Self {
        Self::builtin()
    }
}
