use super::MAX_PROGRAMS;
use crate::error;
use crate::lang::Error;
use tracing::{debug, warn};

type Result<T> = std::result::Result<T, Error>;

/// Bytes of source text shared by all programs.
pub const SOURCE_POOL_SIZE: usize = 8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub offset: u32,
    pub size: u32,
}

impl Region {
    fn start(&self) -> usize {
        self.offset as usize
    }

    fn end(&self) -> usize {
        (self.offset + self.size) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub used: usize,
    pub free: usize,
    pub largest_contiguous: usize,
}

/// ## Source text arena
///
/// Each program owns at most one region. Re-uploading treats the old
/// region as free, placing the new text in the first gap that fits and
/// compacting the arena when only the total free space is large enough.
/// A rejected upload changes nothing.

#[derive(Clone)]
pub struct SourcePool {
    buffer: Vec<u8>,
    regions: [Option<Region>; MAX_PROGRAMS],
}

impl std::fmt::Debug for SourcePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourcePool {:?}", self.regions)
    }
}

impl Default for SourcePool {
    fn default() -> Self {
        SourcePool {
            buffer: vec![0; SOURCE_POOL_SIZE],
            regions: [None; MAX_PROGRAMS],
        }
    }
}

impl SourcePool {
    pub fn new() -> SourcePool {
        SourcePool::default()
    }

    fn check_id(program_id: usize) -> Result<()> {
        if program_id >= MAX_PROGRAMS {
            return Err(error!(InvalidProgramId; &format!("{}", program_id)));
        }
        Ok(())
    }

    pub fn region(&self, program_id: usize) -> Option<Region> {
        self.regions.get(program_id).copied().flatten()
    }

    /// Regions of every program except `skip`, in address order.
    fn others(&self, skip: Option<usize>) -> Vec<(usize, Region)> {
        let mut regions: Vec<(usize, Region)> = self
            .regions
            .iter()
            .enumerate()
            .filter(|(id, _)| Some(*id) != skip)
            .filter_map(|(id, region)| region.map(|r| (id, r)))
            .collect();
        regions.sort_by_key(|(_, r)| r.offset);
        regions
    }

    /// Gaps between regions as `(start, len)`.
    fn gaps(&self, skip: Option<usize>) -> Vec<(usize, usize)> {
        let mut gaps = vec![];
        let mut cursor = 0;
        for (_, region) in self.others(skip) {
            if region.start() > cursor {
                gaps.push((cursor, region.start() - cursor));
            }
            cursor = cursor.max(region.end());
        }
        if cursor < SOURCE_POOL_SIZE {
            gaps.push((cursor, SOURCE_POOL_SIZE - cursor));
        }
        gaps
    }

    pub fn upload(&mut self, program_id: usize, bytes: &[u8]) -> Result<()> {
        SourcePool::check_id(program_id)?;
        if bytes.is_empty() {
            self.free(program_id);
            return Ok(());
        }
        let used_by_others: usize = self
            .others(Some(program_id))
            .iter()
            .map(|(_, r)| r.size as usize)
            .sum();
        let available = SOURCE_POOL_SIZE - used_by_others;
        if bytes.len() > available {
            warn!(program_id, size = bytes.len(), available, "source pool full");
            let msg = format!("NEED {} BYTES, {} FREE", bytes.len(), available);
            return Err(error!(PoolFull; &msg));
        }
        self.regions[program_id] = None;
        let offset = match self
            .gaps(None)
            .into_iter()
            .find(|(_, len)| *len >= bytes.len())
        {
            Some((start, _)) => start,
            None => {
                self.compact();
                SOURCE_POOL_SIZE - self.stats().free
            }
        };
        self.buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.regions[program_id] = Some(Region {
            offset: offset as u32,
            size: bytes.len() as u32,
        });
        debug!(program_id, offset, size = bytes.len(), "source uploaded");
        Ok(())
    }

    pub fn free(&mut self, program_id: usize) {
        if let Some(slot) = self.regions.get_mut(program_id) {
            if let Some(region) = slot.take() {
                debug!(program_id, offset = region.offset, size = region.size, "source freed");
            }
        }
    }

    /// Moves every region down so the free space is one block at the end.
    pub fn compact(&mut self) {
        let mut cursor = 0;
        for (id, region) in self.others(None) {
            if region.start() != cursor {
                self.buffer.copy_within(region.start()..region.end(), cursor);
            }
            self.regions[id] = Some(Region {
                offset: cursor as u32,
                size: region.size,
            });
            cursor += region.size as usize;
        }
        debug!(used = cursor, "source pool compacted");
    }

    pub fn get_source(&self, program_id: usize) -> Option<&[u8]> {
        let region = self.region(program_id)?;
        Some(&self.buffer[region.start()..region.end()])
    }

    pub fn source_str(&self, program_id: usize) -> Option<&str> {
        std::str::from_utf8(self.get_source(program_id)?).ok()
    }

    pub fn stats(&self) -> PoolStats {
        let used: usize = self.regions.iter().flatten().map(|r| r.size as usize).sum();
        let largest_contiguous = self
            .gaps(None)
            .iter()
            .map(|(_, len)| *len)
            .max()
            .unwrap_or(0);
        PoolStats {
            used,
            free: SOURCE_POOL_SIZE - used,
            largest_contiguous,
        }
    }
}
