use crate::{Error, Result};

/// Evenly spaced thresholds between `start` and `end` inclusive, largest first.
///
/// A single step yields `[start]`.
pub fn descending_grid(start: f64, end: f64, steps: i64) -> Result<Vec<f64>> {
	if !start.is_finite() || !end.is_finite() {
		return Err(Error::DegenerateGrid {
			message: format!("endpoints must be finite, got {start} and {end}"),
		});
	}
	if steps <= 0 {
		return Err(Error::DegenerateGrid { message: format!("steps must be positive, got {steps}") });
	}
	if steps == 1 {
		return Ok(vec![start]);
	}
	if start == end {
		return Err(Error::DegenerateGrid {
			message: format!("{steps} steps between equal endpoints {start}"),
		});
	}

	let (low, high) = if start < end { (start, end) } else { (end, start) };
	let intervals = (steps - 1) as f64;
	let mut grid: Vec<f64> =
		(0..steps).map(|k| high - (high - low) * k as f64 / intervals).collect();

	if let Some(last) = grid.last_mut() {
		*last = low;
	}

	Ok(grid)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn single_step_is_start() {
		assert_eq!(descending_grid(2.5, 7.0, 1).expect("Valid grid."), vec![2.5]);
	}

	#[test]
	fn reversed_endpoints_give_the_same_grid() {
		let forward = descending_grid(0.0, 1.0, 5).expect("Valid grid.");
		let backward = descending_grid(1.0, 0.0, 5).expect("Valid grid.");

		assert_eq!(forward, backward);
		assert_eq!(forward, vec![1.0, 0.75, 0.5, 0.25, 0.0]);
	}

	#[test]
	fn degenerate_inputs_are_rejected() {
		for (start, end, steps) in [(1.0, 3.0, 0), (1.0, 3.0, -4), (2.0, 2.0, 3), (f64::NAN, 1.0, 2)]
		{
			assert!(
				matches!(descending_grid(start, end, steps), Err(Error::DegenerateGrid { .. })),
				"Expected a degenerate grid for ({start}, {end}, {steps})."
			);
		}
	}
}
