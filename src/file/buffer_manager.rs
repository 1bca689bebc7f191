use lru::LruCache;
use std::num::NonZeroUsize;

use super::error::{FileError, FileResult};
use super::file_manager::{FileHandle, PagedFileManager};
use super::{DEFAULT_POOL_CAPACITY, PAGE_SIZE, PageId};

/// A key identifying a page in the buffer pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BufferKey {
    file: FileHandle,
    page_id: PageId,
}

/// One cached page
struct Frame {
    data: Vec<u8>,
    dirty: bool,
    pin_count: u32,
}

/// Pin-counted page cache with LRU eviction.
///
/// Pages are accessed through [`PageGuard`]s returned by [`BufferManager::pin`].
/// A guard keeps its frame resident until dropped; dropping it is the unpin.
/// Eviction only ever considers frames with a zero pin count.
pub struct BufferManager {
    /// Underlying file manager
    file_manager: PagedFileManager,
    /// Frame map doubling as the LRU tracker: one hash lookup per operation
    frames: LruCache<BufferKey, Frame>,
    /// Maximum number of resident frames
    capacity: usize,
}

impl BufferManager {
    /// Create a new buffer manager with the default capacity
    pub fn new(file_manager: PagedFileManager) -> Self {
        Self::with_capacity(file_manager, DEFAULT_POOL_CAPACITY)
    }

    /// Create a new buffer manager with specified frame capacity
    pub fn with_capacity(file_manager: PagedFileManager, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            file_manager,
            frames: LruCache::new(NonZeroUsize::new(capacity).unwrap()),
            capacity,
        }
    }

    /// Get a reference to the file manager
    pub fn file_manager(&self) -> &PagedFileManager {
        &self.file_manager
    }

    /// Get a mutable reference to the file manager
    pub fn file_manager_mut(&mut self) -> &mut PagedFileManager {
        &mut self.file_manager
    }

    /// Pin a page, loading it from disk if necessary.
    ///
    /// The returned guard exposes the page bytes and unpins on drop. The
    /// page must already exist in the file; growing the file is the file
    /// manager's job and happens before the pin.
    pub fn pin(&mut self, file: FileHandle, page_id: PageId) -> FileResult<PageGuard<'_>> {
        let key = BufferKey { file, page_id };

        if self.frames.peek(&key).is_none() {
            self.load_frame(key)?;
        }

        // get_mut also promotes the frame in the LRU order
        let frame = self.frames.get_mut(&key).unwrap();
        frame.pin_count += 1;

        Ok(PageGuard { manager: self, key })
    }

    /// Flush all dirty frames to disk and sync the files
    pub fn force_flush_all(&mut self) -> FileResult<()> {
        // Collect first: peek_mut during the write avoids reordering the LRU list
        let mut dirty_keys = Vec::new();
        for (key, frame) in self.frames.iter() {
            if frame.dirty {
                dirty_keys.push(*key);
            }
        }

        for key in dirty_keys {
            if let Some(frame) = self.frames.peek_mut(&key)
                && frame.dirty
            {
                self.file_manager
                    .write_page(key.file, key.page_id, &frame.data)?;
                frame.dirty = false;
            }
        }

        self.file_manager.sync_all()?;
        Ok(())
    }

    /// Flush everything and release the pool, returning the file manager
    pub fn shutdown(mut self) -> FileResult<PagedFileManager> {
        self.force_flush_all()?;
        self.frames.clear();
        Ok(std::mem::take(&mut self.file_manager))
    }

    /// Load a page from disk into a fresh frame, evicting if the pool is full
    fn load_frame(&mut self, key: BufferKey) -> FileResult<()> {
        while self.frames.len() >= self.capacity {
            self.evict_one()?;
        }

        let mut data = vec![0u8; PAGE_SIZE];
        self.file_manager
            .read_page(key.file, key.page_id, &mut data)?;

        self.frames.put(
            key,
            Frame {
                data,
                dirty: false,
                pin_count: 0,
            },
        );

        Ok(())
    }

    /// Evict the least-recently-used unpinned frame, flushing it if dirty
    fn evict_one(&mut self) -> FileResult<()> {
        // iter() walks from most- to least-recently used, so the last
        // unpinned frame seen is the LRU victim
        let mut victim = None;
        for (key, frame) in self.frames.iter() {
            if frame.pin_count == 0 {
                victim = Some(*key);
            }
        }

        let key = victim.ok_or(FileError::NoEvictableFrame)?;
        if let Some(frame) = self.frames.pop(&key)
            && frame.dirty
        {
            self.file_manager
                .write_page(key.file, key.page_id, &frame.data)?;
        }

        Ok(())
    }

    /// Get the number of resident frames
    pub fn resident_page_count(&self) -> usize {
        self.frames.len()
    }

    /// Get the number of frames with a nonzero pin count
    pub fn pinned_page_count(&self) -> usize {
        self.frames.iter().filter(|(_, f)| f.pin_count > 0).count()
    }

    /// Get the number of dirty frames
    pub fn dirty_page_count(&self) -> usize {
        self.frames.iter().filter(|(_, f)| f.dirty).count()
    }

    /// Check if a page is resident
    pub fn is_page_cached(&self, file: FileHandle, page_id: PageId) -> bool {
        self.frames.contains(&BufferKey { file, page_id })
    }
}

impl Drop for BufferManager {
    fn drop(&mut self) {
        // Flush all dirty pages when the buffer manager is dropped
        let _ = self.force_flush_all();
    }
}

/// RAII pin on a buffered page.
///
/// Holds the frame resident while alive; dropping the guard unpins. Mutation
/// goes through [`PageGuard::data_mut`], which sets the dirty bit so the
/// frame is written back on flush or eviction.
pub struct PageGuard<'a> {
    manager: &'a mut BufferManager,
    key: BufferKey,
}

impl PageGuard<'_> {
    /// The pinned page's number
    pub fn page_id(&self) -> PageId {
        self.key.page_id
    }

    /// Read access to the page bytes
    pub fn data(&self) -> &[u8] {
        &self.manager.frames.peek(&self.key).unwrap().data
    }

    /// Write access to the page bytes; marks the frame dirty
    pub fn data_mut(&mut self) -> &mut [u8] {
        let frame = self.manager.frames.peek_mut(&self.key).unwrap();
        frame.dirty = true;
        &mut frame.data
    }

    /// Mark the frame dirty without touching the bytes
    pub fn mark_dirty(&mut self) {
        self.manager.frames.peek_mut(&self.key).unwrap().dirty = true;
    }
}

impl Drop for PageGuard<'_> {
    fn drop(&mut self) {
        if let Some(frame) = self.manager.frames.peek_mut(&self.key) {
            frame.pin_count = frame.pin_count.saturating_sub(1);
        }
    }
}
