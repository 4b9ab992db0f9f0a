/// Reduce `buffer` to exactly `target_len` points by averaging contiguous
/// windows.
///
/// Window `i` spans `floor(i * step)..floor((i + 1) * step)` with
/// `step = len / target_len`, so widths may differ by one sample. When the
/// target is longer than the input some windows are empty; those take the
/// nearest input sample instead of averaging nothing. An empty input yields
/// silence.
pub fn downsample(buffer: &[f32], target_len: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(target_len);
    downsample_into(buffer, target_len, &mut out);
    out
}

/// Same as [`downsample`], reusing `out`'s allocation.
pub fn downsample_into(buffer: &[f32], target_len: usize, out: &mut Vec<f32>) {
    out.clear();
    if buffer.is_empty() {
        out.resize(target_len, 0.0);
        return;
    }

    let step = buffer.len() as f64 / target_len as f64;
    for i in 0..target_len {
        let start = (i as f64 * step).floor() as usize;
        let end = (((i + 1) as f64 * step).floor() as usize).min(buffer.len());

        if end > start {
            let sum: f32 = buffer[start..end].iter().sum();
            out.push(sum / (end - start) as f32);
        } else {
            out.push(buffer[start.min(buffer.len() - 1)]);
        }
    }
}
