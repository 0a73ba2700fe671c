use std::path::PathBuf;

/// Which of the two datasets an action refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DatasetSlot {
    A,
    B,
}

impl DatasetSlot {
    pub fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

/// Upload selection for one dataset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatasetUpload {
    /// Label the dataset is stored and queried under.
    pub prefix: String,
    pub file: Option<PathBuf>,
    /// Last reported percent while this slot is uploading.
    pub progress: Option<u8>,
    /// Server acknowledgement from the last successful upload.
    pub response: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UploadState {
    pub a: DatasetUpload,
    pub b: DatasetUpload,
    pub uploading: bool,
}

impl UploadState {
    pub fn with_prefixes(prefix_a: &str, prefix_b: &str) -> Self {
        Self {
            a: DatasetUpload {
                prefix: prefix_a.to_string(),
                ..DatasetUpload::default()
            },
            b: DatasetUpload {
                prefix: prefix_b.to_string(),
                ..DatasetUpload::default()
            },
            uploading: false,
        }
    }

    pub fn slot(&self, slot: DatasetSlot) -> &DatasetUpload {
        match slot {
            DatasetSlot::A => &self.a,
            DatasetSlot::B => &self.b,
        }
    }

    pub fn slot_mut(&mut self, slot: DatasetSlot) -> &mut DatasetUpload {
        match slot {
            DatasetSlot::A => &mut self.a,
            DatasetSlot::B => &mut self.b,
        }
    }
}
