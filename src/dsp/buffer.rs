/// Fixed-capacity rolling window over the most recent samples.
///
/// Storage is allocated once; pushing never reallocates. Until the window
/// fills up, the unwritten slots read as silence, which matches what an
/// analyser returns right after the stream opens.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    data: Vec<f32>,
    /// Next slot to overwrite, also the oldest sample once full
    head: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity.max(1)],
            head: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn push(&mut self, sample: f32) {
        self.data[self.head] = sample;
        self.head = (self.head + 1) % self.data.len();
    }

    /// Copy the window into `out`, oldest sample first.
    pub fn copy_ordered(&self, out: &mut Vec<f32>) {
        out.clear();
        out.extend_from_slice(&self.data[self.head..]);
        out.extend_from_slice(&self.data[..self.head]);
    }

    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|s| *s = 0.0);
        self.head = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_most_recent_in_order() {
        let mut buf = SampleBuffer::new(4);
        for s in 1..=6 {
            buf.push(s as f32);
        }
        let mut out = Vec::new();
        buf.copy_ordered(&mut out);
        assert_eq!(out, vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_unfilled_slots_read_as_silence() {
        let mut buf = SampleBuffer::new(3);
        buf.push(0.5);
        let mut out = Vec::new();
        buf.copy_ordered(&mut out);
        assert_eq!(out, vec![0.0, 0.0, 0.5]);
    }
}
