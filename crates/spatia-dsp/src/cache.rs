//! Process-wide dataset sharing.
//!
//! Every renderer in the process that asks for the same file and grid gets
//! the same `Arc`. The registry only holds weak references, so a dataset is
//! freed once the last renderer using it is dropped and reloaded by the next
//! one that asks.

use crate::dataset::HrirDataset;
use crate::grid::GridShape;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, Weak};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DatasetKey {
    path: Option<PathBuf>,
    distance_steps: usize,
    azimuth_steps: usize,
    elevation_steps: usize,
    impulse_length: usize,
    min_distance: u32,
    max_distance: u32,
}

impl DatasetKey {
    fn new(path: Option<&Path>, shape: &GridShape) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            distance_steps: shape.distance_steps,
            azimuth_steps: shape.azimuth_steps,
            elevation_steps: shape.elevation_steps,
            impulse_length: shape.impulse_length,
            min_distance: shape.min_distance.to_bits(),
            max_distance: shape.max_distance.to_bits(),
        }
    }
}

type Registry = Mutex<HashMap<DatasetKey, Weak<HrirDataset>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Returns the shared dataset for `path` and `shape`, loading it on first use.
///
/// Loading happens under the registry lock so concurrent first users do not
/// read the file twice. Never call this from the audio thread.
pub fn shared_dataset(path: Option<&Path>, shape: GridShape) -> Arc<HrirDataset> {
    let key = DatasetKey::new(path, &shape);
    let mut entries = registry().lock();
    if let Some(dataset) = entries.get(&key).and_then(Weak::upgrade) {
        tracing::debug!("Reusing shared HRIR dataset");
        return dataset;
    }
    entries.retain(|_, weak| weak.strong_count() > 0);

    let dataset = Arc::new(HrirDataset::load_or_silent(path, shape));
    entries.insert(key, Arc::downgrade(&dataset));
    dataset
}

/// Number of datasets currently alive in the registry.
pub fn live_datasets() -> usize {
    registry()
        .lock()
        .values()
        .filter(|weak| weak.strong_count() > 0)
        .count()
}
