//! Head-related impulse response dataset.
//!
//! All impulse responses live in one contiguous buffer addressed by computed
//! offsets. Two layouts exist:
//!
//! - `Mirrored`: the on-disk format. Only azimuths `0..=π` are stored; the
//!   other half of the circle is the left/right mirror image. Pole rows are
//!   stored once per distance and shared by both channels.
//! - `Full`: every azimuth and every elevation row, used for the silent
//!   fallback when no file can be read.

use crate::error::{Error, Result};
use crate::grid::GridShape;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HrirLayout {
    Mirrored,
    Full,
}

#[derive(Debug)]
pub struct HrirDataset {
    shape: GridShape,
    layout: HrirLayout,
    data: Vec<f32>,
}

impl HrirDataset {
    /// Wraps samples in the mirrored file order:
    /// `[distance][azimuth 0..=A/2][elevation 1..E-1][channel][time]`, then
    /// per distance the two pole blocks `[time]` (elevation 0, then π).
    /// Trailing samples are ignored.
    pub fn from_samples(shape: GridShape, mut samples: Vec<f32>) -> Result<Self> {
        shape.validate()?;
        let expected = shape.mirrored_len();
        if samples.len() < expected {
            return Err(Error::DatasetTooShort {
                expected,
                found: samples.len(),
            });
        }
        samples.truncate(expected);
        Ok(Self {
            shape,
            layout: HrirLayout::Mirrored,
            data: samples,
        })
    }

    /// Decodes little-endian `f32` samples.
    pub fn from_bytes(shape: GridShape, bytes: &[u8]) -> Result<Self> {
        let samples = bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Self::from_samples(shape, samples)
    }

    pub fn load(path: &Path, shape: GridShape) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| Error::DatasetIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(shape, &bytes)
    }

    /// An all-zero dataset in the full layout.
    pub fn silent(shape: GridShape) -> Self {
        Self {
            shape,
            layout: HrirLayout::Full,
            data: vec![0.0; shape.full_len()],
        }
    }

    /// Loads `path`, substituting a silent dataset if that fails.
    pub fn load_or_silent(path: Option<&Path>, shape: GridShape) -> Self {
        let Some(path) = path else {
            tracing::warn!("No HRIR dataset configured, rendering silence");
            return Self::silent(shape);
        };
        match Self::load(path, shape) {
            Ok(dataset) => {
                tracing::info!("Loaded HRIR dataset from {}", path.display());
                dataset
            }
            Err(e) => {
                tracing::warn!("{e}, rendering silence");
                Self::silent(shape)
            }
        }
    }

    #[inline]
    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    #[inline]
    pub fn layout(&self) -> HrirLayout {
        self.layout
    }

    #[inline]
    pub fn impulse_length(&self) -> usize {
        self.shape.impulse_length
    }

    /// Number of addressable azimuth columns.
    pub fn columns(&self) -> usize {
        match self.layout {
            HrirLayout::Mirrored => self.shape.mirrored_columns(),
            HrirLayout::Full => self.shape.azimuth_steps,
        }
    }

    /// Left and right impulse responses at a grid node. `column` is a stored
    /// column index (see [`HrirDataset::columns`]) and `row` runs over
    /// `0..=elevation_steps`. Pole rows ignore the column. Indices beyond the
    /// grid clamp to its edge.
    pub fn impulse(&self, distance: usize, column: usize, row: usize) -> [&[f32]; 2] {
        let shape = &self.shape;
        let len = shape.impulse_length;
        let distance = distance.min(shape.distance_steps - 1);
        let row = row.min(shape.elevation_steps);
        let column = column.min(self.columns() - 1);
        let pole = row == 0 || row == shape.elevation_steps;

        match self.layout {
            HrirLayout::Mirrored if pole => {
                let body = shape.mirrored_len() - shape.distance_steps * 2 * len;
                let which = usize::from(row != 0);
                let start = body + (distance * 2 + which) * len;
                let block = &self.data[start..start + len];
                [block, block]
            }
            HrirLayout::Mirrored => {
                let rows = shape.elevation_steps - 1;
                let node = (distance * shape.mirrored_columns() + column) * rows + (row - 1);
                self.channels_at(node)
            }
            HrirLayout::Full => {
                let column = if pole { 0 } else { column };
                let node = (distance * shape.azimuth_steps + column) * shape.elevation_rows() + row;
                self.channels_at(node)
            }
        }
    }

    #[inline]
    fn channels_at(&self, node: usize) -> [&[f32]; 2] {
        let len = self.shape.impulse_length;
        let start = node * 2 * len;
        [
            &self.data[start..start + len],
            &self.data[start + len..start + 2 * len],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tiny_shape() -> GridShape {
        GridShape {
            distance_steps: 2,
            azimuth_steps: 4,
            elevation_steps: 2,
            impulse_length: 3,
            min_distance: 0.5,
            max_distance: 1.5,
        }
    }

    fn numbered() -> HrirDataset {
        let shape = tiny_shape();
        let samples = (0..shape.mirrored_len()).map(|i| i as f32).collect();
        HrirDataset::from_samples(shape, samples).unwrap()
    }

    #[test]
    fn test_mirrored_offsets() {
        let dataset = numbered();
        // distance 1, column 2, row 1: node (1 * 3 + 2) * 1 + 0 = 5
        let [left, right] = dataset.impulse(1, 2, 1);
        assert_eq!(left, &[30.0, 31.0, 32.0]);
        assert_eq!(right, &[33.0, 34.0, 35.0]);
    }

    #[test]
    fn test_pole_blocks_shared_by_channels() {
        let dataset = numbered();
        let [left, right] = dataset.impulse(1, 0, 2);
        assert_eq!(left, right);
        // Poles start after 36 body samples: distance 1, second pole.
        assert_eq!(left, &[45.0, 46.0, 47.0]);
        assert_eq!(dataset.impulse(1, 2, 2), dataset.impulse(1, 0, 2));
    }

    #[test]
    fn test_short_dataset_rejected() {
        let result = HrirDataset::from_samples(tiny_shape(), vec![0.0; 10]);
        assert!(matches!(
            result,
            Err(Error::DatasetTooShort {
                expected: 48,
                found: 10
            })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let shape = tiny_shape();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..shape.mirrored_len() {
            file.write_all(&(i as f32).to_le_bytes()).unwrap();
        }
        file.flush().unwrap();

        let dataset = HrirDataset::load(file.path(), shape).unwrap();
        assert_eq!(dataset.layout(), HrirLayout::Mirrored);
        assert_eq!(dataset.impulse(0, 0, 1)[0], &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_missing_file_falls_back_to_silence() {
        let dataset =
            HrirDataset::load_or_silent(Some(Path::new("/nonexistent/hrir.bin")), tiny_shape());
        assert_eq!(dataset.layout(), HrirLayout::Full);
        assert_eq!(dataset.columns(), 4);
        assert!(dataset.impulse(0, 3, 1)[1].iter().all(|&s| s == 0.0));
    }
}
