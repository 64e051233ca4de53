//! Fixed-height vertical slices of the generated course.

use glam::Vec2;

/// Unique identifier assigned to a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(u32);

impl ChunkId {
    /// Creates a new chunk identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Identifier that follows this one.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Vertical slice of the world used as the unit of generation and cleanup.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightChunk {
    id: ChunkId,
    start_y: f32,
    end_y: f32,
    platforms: Vec<Vec2>,
    content_log: Vec<String>,
}

impl HeightChunk {
    /// Creates an empty chunk spanning `start_y..start_y + height`.
    #[must_use]
    pub fn new(id: ChunkId, start_y: f32, height: f32) -> Self {
        Self {
            id,
            start_y,
            end_y: start_y + height,
            platforms: Vec::new(),
            content_log: Vec::new(),
        }
    }

    /// Identifier of the chunk.
    #[must_use]
    pub const fn id(&self) -> ChunkId {
        self.id
    }

    /// Lower edge of the chunk.
    #[must_use]
    pub const fn start_y(&self) -> f32 {
        self.start_y
    }

    /// Upper edge of the chunk.
    #[must_use]
    pub const fn end_y(&self) -> f32 {
        self.end_y
    }

    /// Vertical extent of the chunk.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.end_y - self.start_y
    }

    /// Platforms realized inside the chunk, in generation order.
    #[must_use]
    pub fn platforms(&self) -> &[Vec2] {
        &self.platforms
    }

    /// Mutable access to the realized platforms, used by post-processors.
    pub fn platforms_mut(&mut self) -> &mut Vec<Vec2> {
        &mut self.platforms
    }

    /// Records a realized platform.
    pub fn record_platform(&mut self, position: Vec2) {
        self.platforms.push(position);
    }

    /// Descriptions of the content generated while populating the chunk.
    #[must_use]
    pub fn content_log(&self) -> &[String] {
        &self.content_log
    }

    /// Appends a content description.
    pub fn record_content(&mut self, description: impl Into<String>) {
        self.content_log.push(description.into());
    }
}
