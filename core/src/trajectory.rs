use crate::geometry::Point;

/// Fixed-capacity FIFO of pre-computed ball positions.
///
/// One slot is always left empty to tell "full" from "empty", so at most
/// `capacity - 1` points are live: `available() + free() == capacity - 1`.
pub struct TrajectoryQueue {
    buffer: Vec<Point>,
    head: usize,
    tail: usize,
}

impl TrajectoryQueue {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "trajectory queue needs at least two slots");
        Self {
            buffer: vec![Point::default(); capacity],
            head: 0,
            tail: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of queued points.
    pub fn available(&self) -> usize {
        let capacity = self.capacity();
        (capacity + self.head - self.tail) % capacity
    }

    pub fn free(&self) -> usize {
        self.capacity() - 1 - self.available()
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Appends a point. Returns `false` when no free slot is left.
    pub fn put(&mut self, point: Point) -> bool {
        let next = (self.head + 1) % self.capacity();
        if next == self.tail {
            return false;
        }
        self.buffer[self.head] = point;
        self.head = next;
        true
    }

    pub fn get(&mut self) -> Option<Point> {
        if self.is_empty() {
            return None;
        }
        let point = self.buffer[self.tail];
        self.tail = (self.tail + 1) % self.capacity();
        Some(point)
    }

    /// Empties the queue without touching the stored points.
    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
    }
}
