//! Mock non-volatile memory for testing the calibration store

use orp_sensor::{ERASED_WORD, NvMemory};
use std::cell::RefCell;
use std::rc::Rc;

/// Size of the simulated medium in bytes
pub const MEMORY_SIZE: usize = 1024;

/// Records operations performed on the mock memory
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Read operation
    Read {
        /// First byte read
        address: u16,
        /// Number of bytes read
        len: usize,
    },
    /// Write operation
    Write {
        /// First byte written
        address: u16,
        /// Bytes written
        data: Vec<u8>,
    },
}

/// Shared state for mock memory (uses interior mutability)
#[derive(Debug)]
struct MockState {
    /// Simulated medium contents
    bytes: Vec<u8>,

    /// Operations log for verification
    operations: Vec<Operation>,

    /// Failure injection flags
    fail_next_read: bool,
    fail_next_write: bool,
    /// Number of writes to let through before failing, if set
    fail_write_after: Option<usize>,
}

impl MockState {
    fn new() -> Self {
        let [low, high] = ERASED_WORD.to_le_bytes();
        assert_eq!(low, high);
        Self {
            bytes: vec![low; MEMORY_SIZE],
            operations: Vec::new(),
            fail_next_read: false,
            fail_next_write: false,
            fail_write_after: None,
        }
    }

    fn range(address: u16, len: usize) -> Result<std::ops::Range<usize>, MockError> {
        let start = usize::from(address);
        let end = start + len;
        if end > MEMORY_SIZE {
            return Err(MockError::OutOfBounds);
        }
        Ok(start..end)
    }
}

/// Mock memory for testing
///
/// Clones share state, so a test can keep a handle after moving one into
/// the sensor.
#[derive(Clone)]
pub struct MockMemory {
    state: Rc<RefCell<MockState>>,
}

impl MockMemory {
    /// Create an erased mock memory (all bytes 0xFF)
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState::new())),
        }
    }

    /// Create a mock memory holding `image` at `address`
    pub fn with_image(address: u16, image: &[u8]) -> Self {
        let memory = Self::new();
        memory.load_image(address, image);
        memory
    }

    /// Overwrite bytes without recording an operation
    pub fn load_image(&self, address: u16, image: &[u8]) {
        let start = usize::from(address);
        self.state.borrow_mut().bytes[start..start + image.len()].copy_from_slice(image);
    }

    /// Current contents of `len` bytes at `address`
    pub fn bytes(&self, address: u16, len: usize) -> Vec<u8> {
        let start = usize::from(address);
        self.state.borrow().bytes[start..start + len].to_vec()
    }

    /// Current little-endian word at `address`
    pub fn word(&self, address: u16) -> u16 {
        let bytes = self.bytes(address, 2);
        u16::from_le_bytes([bytes[0], bytes[1]])
    }

    /// Inject a read failure on the next read operation
    pub fn fail_next_read(&self) {
        self.state.borrow_mut().fail_next_read = true;
    }

    /// Inject a write failure on the next write operation
    pub fn fail_next_write(&self) {
        self.state.borrow_mut().fail_next_write = true;
    }

    /// Let `count` writes succeed, then fail the following one
    pub fn fail_write_after(&self, count: usize) {
        self.state.borrow_mut().fail_write_after = Some(count);
    }

    /// Get the operations log
    pub fn operations(&self) -> Vec<Operation> {
        self.state.borrow().operations.clone()
    }

    /// Clear the operations log
    pub fn clear_operations(&self) {
        self.state.borrow_mut().operations.clear();
    }

    /// Count write operations
    pub fn write_count(&self) -> usize {
        self.state
            .borrow()
            .operations
            .iter()
            .filter(|op| matches!(op, Operation::Write { .. }))
            .count()
    }

    /// Addresses of all reads, in order
    pub fn read_addresses(&self) -> Vec<u16> {
        self.state
            .borrow()
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::Read { address, .. } => Some(*address),
                Operation::Write { .. } => None,
            })
            .collect()
    }
}

impl Default for MockMemory {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock error type
#[derive(Debug, Clone, PartialEq)]
pub enum MockError {
    /// Simulated medium failure
    Medium,
    /// Access beyond the simulated medium
    OutOfBounds,
}

impl NvMemory for MockMemory {
    type Error = MockError;

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        // Check for injected failure
        if state.fail_next_read {
            state.fail_next_read = false;
            return Err(MockError::Medium);
        }

        let range = MockState::range(address, buf.len())?;
        buf.copy_from_slice(&state.bytes[range]);
        state.operations.push(Operation::Read {
            address,
            len: buf.len(),
        });
        Ok(())
    }

    fn write(&mut self, address: u16, data: &[u8]) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        // Check for injected failure
        if state.fail_next_write {
            state.fail_next_write = false;
            return Err(MockError::Medium);
        }
        if let Some(remaining) = state.fail_write_after {
            if remaining == 0 {
                state.fail_write_after = None;
                return Err(MockError::Medium);
            }
            state.fail_write_after = Some(remaining - 1);
        }

        let range = MockState::range(address, data.len())?;
        state.bytes[range].copy_from_slice(data);
        state.operations.push(Operation::Write {
            address,
            data: data.to_vec(),
        });
        Ok(())
    }
}
