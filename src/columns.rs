use crate::error::{Result, TableChartError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSlot {
    pub x: i32,
    pub width: i32,
}

/// Pixel geometry of every column; widths always sum to the table width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    slots: Vec<ColumnSlot>,
}

impl ColumnLayout {
    pub fn slots(&self) -> &[ColumnSlot] {
        &self.slots
    }

    pub fn get(&self, column: usize) -> Option<ColumnSlot> {
        self.slots.get(column).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn total_width(&self) -> i32 {
        self.slots.iter().map(|slot| slot.width).sum()
    }

    pub fn widths(&self) -> Vec<i32> {
        self.slots.iter().map(|slot| slot.width).collect()
    }
}

/// Weights used for `column_count` columns. A list whose length differs from
/// the column count is replaced by uniform weights.
pub fn resolve_weights(spans: &[i64], column_count: usize) -> Vec<i64> {
    if spans.len() == column_count {
        return spans.to_vec();
    }
    if !spans.is_empty() {
        log::debug!(
            "{} column weights for {} columns, using uniform weights",
            spans.len(),
            column_count
        );
    }
    vec![1; column_count]
}

/// Splits `total_width` proportionally to `weights`. Each column gets the
/// floor of its share; the last column absorbs the rounding remainder.
pub fn allocate(total_width: i32, weights: &[i64]) -> Result<ColumnLayout> {
    if total_width <= 0 {
        return Err(TableChartError::invalid(format!(
            "table width must be positive, got {total_width}"
        )));
    }
    if weights.is_empty() {
        return Err(TableChartError::invalid("no columns to allocate"));
    }
    if let Some((index, weight)) = weights.iter().enumerate().find(|(_, w)| **w <= 0) {
        return Err(TableChartError::invalid(format!(
            "column {index} has non-positive weight {weight}"
        )));
    }

    let sum: i128 = weights.iter().map(|w| *w as i128).sum();
    let total = total_width as i128;
    let mut slots = Vec::with_capacity(weights.len());
    let mut x = 0i32;
    for (index, weight) in weights.iter().enumerate() {
        let width = if index + 1 == weights.len() {
            total_width - x
        } else {
            (total * (*weight as i128) / sum) as i32
        };
        slots.push(ColumnSlot { x, width });
        x += width;
    }
    Ok(ColumnLayout { slots })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_weights_split_evenly() {
        let layout = allocate(600, &[1, 1]).unwrap();
        assert_eq!(
            layout.slots(),
            &[
                ColumnSlot { x: 0, width: 300 },
                ColumnSlot { x: 300, width: 300 }
            ]
        );
    }

    #[test]
    fn weighted_columns_follow_ratios() {
        let layout = allocate(600, &[1, 1, 2, 1, 1]).unwrap();
        assert_eq!(layout.widths(), vec![100, 100, 200, 100, 100]);
        let starts: Vec<i32> = layout.slots().iter().map(|s| s.x).collect();
        assert_eq!(starts, vec![0, 100, 200, 400, 500]);
    }

    #[test]
    fn last_column_absorbs_remainder() {
        let layout = allocate(100, &[1, 1, 1]).unwrap();
        assert_eq!(layout.widths(), vec![33, 33, 34]);
        for width in [1, 7, 99, 601, 1023] {
            for weights in [vec![1, 2, 3], vec![5, 1], vec![3, 3, 3, 3, 3, 3, 7]] {
                let layout = allocate(width, &weights).unwrap();
                assert_eq!(layout.total_width(), width, "width {width} weights {weights:?}");
            }
        }
    }

    #[test]
    fn rejects_non_positive_input() {
        assert!(allocate(0, &[1]).unwrap_err().is_invalid_spec());
        assert!(allocate(-5, &[1]).unwrap_err().is_invalid_spec());
        assert!(allocate(100, &[1, 0]).unwrap_err().is_invalid_spec());
        assert!(allocate(100, &[2, -1]).unwrap_err().is_invalid_spec());
        assert!(allocate(100, &[]).unwrap_err().is_invalid_spec());
    }

    #[test]
    fn mismatched_weights_reset_to_uniform() {
        assert_eq!(resolve_weights(&[1, 1, 2, 1], 5), vec![1; 5]);
        assert_eq!(resolve_weights(&[], 3), vec![1; 3]);
        assert_eq!(resolve_weights(&[2, 1], 2), vec![2, 1]);
    }
}
