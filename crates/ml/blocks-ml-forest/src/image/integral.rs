//! Integral-image cumulants and the seed-driven hierarchical feature oracle
//! they back.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use crate::algorithms::trees::sample::FeatureOracle;
use crate::ingest::GreyImage;

/// A half-open pixel rectangle: columns `[x0, x1)`, rows `[y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Rect {
    pub fn width(&self) -> usize {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Mass, centroid, second moments, and edge densities over one rectangle.
/// A zero-mass rectangle reports `reference`'s centroid and zeroed moments.
#[derive(Clone, Copy, Debug, Default)]
pub struct RectStats {
    pub mass: f64,
    pub centroid_x: f64,
    pub centroid_y: f64,
    pub var_x: f64,
    pub var_y: f64,
    pub cov_xy: f64,
    pub vertical_edge_density: f64,
    pub horizontal_edge_density: f64,
}

/// Eight inclusive 2-D prefix-sum grids over one greyscale image: mass
/// (intensity), first/second moments in x and y, the xy cross moment, and
/// two absolute-difference cumulants for edge energy. Each grid is
/// `(width+1) x (height+1)` so a rectangle query is four corner lookups with
/// no bounds-checking for the empty prefix.
pub struct ImageOracleTable {
    width: usize,
    height: usize,
    sum_mass: Vec<f64>,
    sum_x: Vec<f64>,
    sum_y: Vec<f64>,
    sum_xx: Vec<f64>,
    sum_yy: Vec<f64>,
    sum_xy: Vec<f64>,
    sum_vedge: Vec<f64>,
    sum_hedge: Vec<f64>,
}

impl ImageOracleTable {
    pub fn new(image: &GreyImage) -> Self {
        let width = image.width();
        let height = image.height();
        let stride = width + 1;
        let grid_len = stride * (height + 1);

        let mut sum_mass = vec![0.0; grid_len];
        let mut sum_x = vec![0.0; grid_len];
        let mut sum_y = vec![0.0; grid_len];
        let mut sum_xx = vec![0.0; grid_len];
        let mut sum_yy = vec![0.0; grid_len];
        let mut sum_xy = vec![0.0; grid_len];
        let mut sum_vedge = vec![0.0; grid_len];
        let mut sum_hedge = vec![0.0; grid_len];

        let idx = |x: usize, y: usize| y * stride + x;

        for y in 0..height {
            for x in 0..width {
                let v = image.pixel(x, y);
                let left = if x > 0 { image.pixel(x - 1, y) } else { 0.0 };
                let up = if y > 0 { image.pixel(x, y - 1) } else { 0.0 };

                let cur = idx(x + 1, y + 1);
                let above = idx(x + 1, y);
                let before = idx(x, y + 1);
                let diag = idx(x, y);

                sum_mass[cur] = sum_mass[above] + sum_mass[before] - sum_mass[diag] + v;
                sum_x[cur] = sum_x[above] + sum_x[before] - sum_x[diag] + v * x as f64;
                sum_y[cur] = sum_y[above] + sum_y[before] - sum_y[diag] + v * y as f64;
                sum_xx[cur] = sum_xx[above] + sum_xx[before] - sum_xx[diag] + v * (x * x) as f64;
                sum_yy[cur] = sum_yy[above] + sum_yy[before] - sum_yy[diag] + v * (y * y) as f64;
                sum_xy[cur] = sum_xy[above] + sum_xy[before] - sum_xy[diag] + v * (x * y) as f64;
                sum_vedge[cur] =
                    sum_vedge[above] + sum_vedge[before] - sum_vedge[diag] + (v - left).abs();
                sum_hedge[cur] =
                    sum_hedge[above] + sum_hedge[before] - sum_hedge[diag] + (v - up).abs();
            }
        }

        Self {
            width,
            height,
            sum_mass,
            sum_x,
            sum_y,
            sum_xx,
            sum_yy,
            sum_xy,
            sum_vedge,
            sum_hedge,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn idx(&self, x: usize, y: usize) -> usize {
        y * (self.width + 1) + x
    }

    fn query(&self, grid: &[f64], rect: Rect) -> f64 {
        grid[self.idx(rect.x1, rect.y1)] - grid[self.idx(rect.x0, rect.y1)]
            - grid[self.idx(rect.x1, rect.y0)]
            + grid[self.idx(rect.x0, rect.y0)]
    }

    /// Rectangle statistics per §4.5: a zero-mass (or empty) rectangle
    /// reports `reference` as its centroid with zeroed second moments, but
    /// still computes edge densities, which do not depend on mass.
    pub fn rect_stats(&self, rect: Rect, reference: (f64, f64)) -> RectStats {
        if rect.is_empty() {
            return RectStats {
                centroid_x: reference.0,
                centroid_y: reference.1,
                ..Default::default()
            };
        }

        let mass = self.query(&self.sum_mass, rect);
        let vedge = self.query(&self.sum_vedge, rect);
        let hedge = self.query(&self.sum_hedge, rect);
        let vertical_edge_density = vedge / 255.0 / rect.height() as f64;
        let horizontal_edge_density = hedge / 255.0 / rect.width() as f64;

        if mass <= 0.0 {
            return RectStats {
                mass: 0.0,
                centroid_x: reference.0,
                centroid_y: reference.1,
                var_x: 0.0,
                var_y: 0.0,
                cov_xy: 0.0,
                vertical_edge_density,
                horizontal_edge_density,
            };
        }

        let sx = self.query(&self.sum_x, rect);
        let sy = self.query(&self.sum_y, rect);
        let sxx = self.query(&self.sum_xx, rect);
        let syy = self.query(&self.sum_yy, rect);
        let sxy = self.query(&self.sum_xy, rect);

        let centroid_x = sx / mass;
        let centroid_y = sy / mass;
        let var_x = sxx / mass - centroid_x * centroid_x;
        let var_y = syy / mass - centroid_y * centroid_y;
        let cov_xy = sxy / mass - centroid_x * centroid_y;

        RectStats {
            mass,
            centroid_x,
            centroid_y,
            var_x,
            var_y,
            cov_xy,
            vertical_edge_density,
            horizontal_edge_density,
        }
    }

    /// `RandomFeature(s)` of §4.5: consume `s` to pick a refinement depth,
    /// then recursively descend the quadrant/half split, consuming more of
    /// `s` at each level, until a terminal attribute is drawn.
    pub fn random_feature(&self, seed: i64) -> f64 {
        let depth = seed.rem_euclid(5) as u32;
        let remainder = seed.div_euclid(5);
        let full = Rect {
            x0: 0,
            y0: 0,
            x1: self.width,
            y1: self.height,
        };
        self.descend(full, (0.0, 0.0), depth, remainder)
    }

    fn descend(&self, rect: Rect, reference: (f64, f64), depth: u32, s: i64) -> f64 {
        if rect.is_empty() {
            return 0.0;
        }
        let stats = self.rect_stats(rect, reference);

        if depth == 0 {
            return match s.rem_euclid(10) {
                0 => stats.mass,
                1 => stats.centroid_x - reference.0,
                2 => stats.centroid_y - reference.1,
                3 => stats.var_x,
                4 => stats.var_y,
                5 => stats.cov_xy,
                6 => stats.var_x + stats.var_y,
                7 => stats.var_x * stats.var_y - stats.cov_xy * stats.cov_xy,
                8 => stats.vertical_edge_density,
                _ => stats.horizontal_edge_density,
            };
        }

        let partition = s.rem_euclid(6);
        let remainder = s.div_euclid(6);
        let new_reference = (stats.centroid_x, stats.centroid_y);

        let split_x = (stats.centroid_x.ceil() as i64).clamp(rect.x0 as i64, rect.x1 as i64) as usize;
        let split_y = (stats.centroid_y.ceil() as i64).clamp(rect.y0 as i64, rect.y1 as i64) as usize;

        let upper = Rect { y1: split_y, ..rect };
        let lower = Rect { y0: split_y, ..rect };
        let left = Rect { x1: split_x, ..rect };
        let right = Rect { x0: split_x, ..rect };

        match partition {
            0 => self.descend(upper, new_reference, depth - 1, remainder),
            1 => self.descend(lower, new_reference, depth - 1, remainder),
            2 => self.descend(left, new_reference, depth - 1, remainder),
            3 => self.descend(right, new_reference, depth - 1, remainder),
            4 => {
                self.descend(upper, new_reference, depth - 1, remainder)
                    - self.descend(lower, new_reference, depth - 1, remainder)
            }
            _ => {
                self.descend(left, new_reference, depth - 1, remainder)
                    - self.descend(right, new_reference, depth - 1, remainder)
            }
        }
    }
}

const NO_MEMO: i64 = -1;

/// A [`FeatureOracle`] over one image's cumulant table: holds a shared
/// reference into the table plus a single-slot memo of the last seed it
/// answered, so repeated queries for the same seed during a sort-and-sweep
/// split are O(1). The memo is atomics, not a `Cell`, so a `Sample` wrapping
/// this oracle stays `Sync` and can be shared across the `parallel`
/// feature's rayon threads.
pub struct ImageOracle {
    table: Arc<ImageOracleTable>,
    memo_seed: AtomicI64,
    memo_value: AtomicU64,
}

impl ImageOracle {
    pub fn new(table: Arc<ImageOracleTable>) -> Self {
        Self {
            table,
            memo_seed: AtomicI64::new(NO_MEMO),
            memo_value: AtomicU64::new(0),
        }
    }
}

impl FeatureOracle for ImageOracle {
    fn feature(&self, seed: i64) -> f64 {
        if self.memo_seed.load(Ordering::Relaxed) == seed {
            return f64::from_bits(self.memo_value.load(Ordering::Relaxed));
        }
        let value = self.table.random_feature(seed);
        self.memo_seed.store(seed, Ordering::Relaxed);
        self.memo_value.store(value.to_bits(), Ordering::Relaxed);
        value
    }
}
