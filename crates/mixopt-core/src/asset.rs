use std::path::Path;

/// Extensions of the structured level records that embed asset names.
pub const LEVEL_DATA_EXTENSIONS: &[&str] = &["lsd", "ldd", "ddb", "tdb"];

/// Final path component of an entry name.
pub fn file_name_of(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Logical asset type, derived from the file extension (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Dds,
    Tga,
    Mp3,
    Wav,
    LevelData,
    Other,
}

impl AssetKind {
    pub fn from_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "dds" => AssetKind::Dds,
            "tga" => AssetKind::Tga,
            "mp3" => AssetKind::Mp3,
            "wav" => AssetKind::Wav,
            e if LEVEL_DATA_EXTENSIONS.contains(&e) => AssetKind::LevelData,
            _ => AssetKind::Other,
        }
    }

    /// Upper-case label used in the change summary ("TGA --> DDS").
    pub fn label(self) -> &'static str {
        match self {
            AssetKind::Dds => "DDS",
            AssetKind::Tga => "TGA",
            AssetKind::Mp3 => "MP3",
            AssetKind::Wav => "WAV",
            AssetKind::LevelData => "LEVEL",
            AssetKind::Other => "?",
        }
    }

    pub fn is_texture(self) -> bool {
        matches!(self, AssetKind::Dds | AssetKind::Tga)
    }

    pub fn is_sound(self) -> bool {
        matches!(self, AssetKind::Mp3 | AssetKind::Wav)
    }
}

/// One named entry of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Entry name as stored in the package (may contain directories)
    pub name: String,
    /// Raw entry bytes
    pub data: Vec<u8>,
}

impl Asset {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn kind(&self) -> AssetKind {
        AssetKind::from_name(&self.name)
    }

    /// Final path component of the name.
    pub fn file_name(&self) -> &str {
        file_name_of(&self.name)
    }

    /// The name with its extension swapped, keeping any directory prefix.
    pub fn renamed_extension(&self, ext: &str) -> String {
        let file_name = self.file_name();
        let prefix = &self.name[..self.name.len() - file_name.len()];
        let stem = match file_name.rfind('.') {
            Some(0) | None => file_name,
            Some(dot) => &file_name[..dot],
        };
        format!("{}{}.{}", prefix, stem, ext)
    }
}
