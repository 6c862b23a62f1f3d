//! Raw file selections and the shapefile bundles resolved from them.
//!
//! A [`ShapefileBundle`] is either the classic four-component set or a single
//! compressed archive. The two forms are variants of [`BundleContents`], so a
//! bundle can never carry both.

/// Extension identifying a compressed shapefile archive.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// One file chosen by the user, held entirely in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct RawFile {
    /// File name including its extension, without any directory component.
    pub name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl RawFile {
    /// Construct a raw file from a name and its contents.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl std::fmt::Debug for RawFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFile")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// The four mandatory members of a component shapefile.
#[derive(Clone, PartialEq, Eq)]
pub struct ShapefileComponents {
    /// Geometry records (`.shp`).
    pub shp: Vec<u8>,
    /// Attribute table (`.dbf`).
    pub dbf: Vec<u8>,
    /// Projection definition text (`.prj`).
    pub prj: Vec<u8>,
    /// Shape index (`.shx`).
    pub shx: Vec<u8>,
}

impl ShapefileComponents {
    /// Projection definition decoded as text.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected; the lookup
    /// service is the authority on whether the text is usable.
    pub fn prj_text(&self) -> String {
        String::from_utf8_lossy(&self.prj).into_owned()
    }
}

impl std::fmt::Debug for ShapefileComponents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapefileComponents")
            .field("shp", &self.shp.len())
            .field("dbf", &self.dbf.len())
            .field("prj", &self.prj.len())
            .field("shx", &self.shx.len())
            .finish()
    }
}

/// The populated form of a [`ShapefileBundle`].
#[derive(Clone, PartialEq, Eq)]
pub enum BundleContents {
    /// Separate `.shp`, `.dbf`, `.prj` and `.shx` buffers.
    Components(ShapefileComponents),
    /// A single compressed archive holding one or more layers.
    Archive(Vec<u8>),
}

impl std::fmt::Debug for BundleContents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Components(components) => f.debug_tuple("Components").field(components).finish(),
            Self::Archive(bytes) => f.debug_tuple("Archive").field(&bytes.len()).finish(),
        }
    }
}

/// A resolved file set identified as one shapefile.
///
/// The bundle is named by the shared filename stem of its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapefileBundle {
    name: String,
    contents: BundleContents,
}

impl ShapefileBundle {
    /// Construct a component bundle.
    pub fn from_components(name: impl Into<String>, components: ShapefileComponents) -> Self {
        Self {
            name: name.into(),
            contents: BundleContents::Components(components),
        }
    }

    /// Construct an archive bundle.
    pub fn from_archive(name: impl Into<String>, archive: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: BundleContents::Archive(archive.into()),
        }
    }

    /// Filename stem shared by every member of the bundle.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The populated form of the bundle.
    pub const fn contents(&self) -> &BundleContents {
        &self.contents
    }

    /// Whether the bundle was supplied as a single archive.
    pub const fn is_archive(&self) -> bool {
        matches!(self.contents, BundleContents::Archive(_))
    }
}
