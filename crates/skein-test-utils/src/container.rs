//! In-memory implementation of the container interface.

use indexmap::IndexMap;

use skein_core::container::{Container, ContainerError, ContainerStore, DatasetSpec};
use skein_core::param::ParamValue;

/// One object in the hierarchy, keyed by full path.
#[derive(Clone, Debug)]
enum Object {
    Group,
    Series {
        spec: DatasetSpec,
        rows: Vec<Vec<f64>>,
    },
    Scalar(ParamValue),
    Link {
        source: String,
        source_path: String,
    },
}

/// In-memory hierarchical store backed by a path-keyed map.
///
/// Paths are `/`-separated. Groups along a written path are created
/// implicitly. Insertion order is preserved, matching the insertion
/// ordering the real container library guarantees.
#[derive(Clone, Debug, Default)]
pub struct MemContainer {
    objects: IndexMap<String, Object>,
}

impl MemContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target of an external link, for assertions: `(source, source_path)`.
    pub fn link_target(&self, path: &str) -> Option<(&str, &str)> {
        match self.objects.get(path) {
            Some(Object::Link {
                source,
                source_path,
            }) => Some((source, source_path)),
            _ => None,
        }
    }

    fn ensure_parents(&mut self, path: &str) {
        let mut prefix = String::new();
        for segment in path.split('/').rev().skip(1).collect::<Vec<_>>().iter().rev() {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            if !self.objects.contains_key(&prefix) {
                self.objects.insert(prefix.clone(), Object::Group);
            }
        }
    }

    fn series(&self, path: &str) -> Result<(&DatasetSpec, &Vec<Vec<f64>>), ContainerError> {
        match self.objects.get(path) {
            Some(Object::Series { spec, rows }) => Ok((spec, rows)),
            Some(_) => Err(ContainerError::NotADataset {
                path: path.to_string(),
            }),
            None => Err(ContainerError::NotFound {
                path: path.to_string(),
            }),
        }
    }
}

impl Container for MemContainer {
    fn has(&self, path: &str) -> bool {
        let prefix = format!("{path}/");
        self.objects.contains_key(path) || self.objects.keys().any(|k| k.starts_with(&prefix))
    }

    fn create_group(&mut self, path: &str) -> Result<(), ContainerError> {
        if self.objects.contains_key(path) {
            return Err(ContainerError::AlreadyExists {
                path: path.to_string(),
            });
        }
        self.ensure_parents(path);
        self.objects.insert(path.to_string(), Object::Group);
        Ok(())
    }

    fn keys(&self, path: &str) -> Result<Vec<String>, ContainerError> {
        if !self.has(path) {
            return Err(ContainerError::NotFound {
                path: path.to_string(),
            });
        }
        let prefix = format!("{path}/");
        let mut out = Vec::new();
        for key in self.objects.keys() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                let child = rest.split('/').next().unwrap_or(rest);
                if !out.iter().any(|c| c == child) {
                    out.push(child.to_string());
                }
            }
        }
        Ok(out)
    }

    fn create_time_series(&mut self, path: &str, spec: DatasetSpec) -> Result<(), ContainerError> {
        if self.objects.contains_key(path) {
            return Err(ContainerError::AlreadyExists {
                path: path.to_string(),
            });
        }
        self.ensure_parents(path);
        // Time axis starts at length 1, grown in place by write_row.
        let rows = vec![vec![0.0; spec.row_elems()]];
        self.objects
            .insert(path.to_string(), Object::Series { spec, rows });
        Ok(())
    }

    fn dataset_spec(&self, path: &str) -> Result<DatasetSpec, ContainerError> {
        self.series(path).map(|(spec, _)| spec.clone())
    }

    fn write_row(&mut self, path: &str, t: usize, row: &[f64]) -> Result<(), ContainerError> {
        let expected = self.series(path)?.0.row_elems();
        if row.len() != expected {
            return Err(ContainerError::RowShapeMismatch {
                path: path.to_string(),
                expected,
                found: row.len(),
            });
        }
        if let Some(Object::Series { rows, .. }) = self.objects.get_mut(path) {
            if t >= rows.len() {
                rows.resize(t + 1, vec![0.0; expected]);
            }
            rows[t] = row.to_vec();
        }
        Ok(())
    }

    fn read_row(&self, path: &str, t: usize) -> Result<Vec<f64>, ContainerError> {
        let (_, rows) = self.series(path)?;
        rows.get(t).cloned().ok_or(ContainerError::WindowOutOfRange {
            path: path.to_string(),
            t0: t,
            t1: t,
            len: rows.len(),
        })
    }

    fn read_window(
        &self,
        path: &str,
        t0: usize,
        t1: usize,
    ) -> Result<Vec<Vec<f64>>, ContainerError> {
        let (_, rows) = self.series(path)?;
        if t0 > t1 || t1 >= rows.len() {
            return Err(ContainerError::WindowOutOfRange {
                path: path.to_string(),
                t0,
                t1,
                len: rows.len(),
            });
        }
        Ok(rows[t0..=t1].to_vec())
    }

    fn sample_count(&self, path: &str) -> Result<usize, ContainerError> {
        self.series(path).map(|(_, rows)| rows.len())
    }

    fn write_scalar(&mut self, path: &str, value: ParamValue) -> Result<(), ContainerError> {
        match self.objects.get(path) {
            Some(Object::Scalar(_)) | None => {
                self.ensure_parents(path);
                self.objects.insert(path.to_string(), Object::Scalar(value));
                Ok(())
            }
            Some(_) => Err(ContainerError::NotAScalar {
                path: path.to_string(),
            }),
        }
    }

    fn read_scalar(&self, path: &str) -> Result<ParamValue, ContainerError> {
        match self.objects.get(path) {
            Some(Object::Scalar(v)) => Ok(v.clone()),
            Some(_) => Err(ContainerError::NotAScalar {
                path: path.to_string(),
            }),
            None => Err(ContainerError::NotFound {
                path: path.to_string(),
            }),
        }
    }

    fn link_external(
        &mut self,
        path: &str,
        source: &str,
        source_path: &str,
    ) -> Result<(), ContainerError> {
        if self.objects.contains_key(path) {
            return Err(ContainerError::AlreadyExists {
                path: path.to_string(),
            });
        }
        self.ensure_parents(path);
        self.objects.insert(
            path.to_string(),
            Object::Link {
                source: source.to_string(),
                source_path: source_path.to_string(),
            },
        );
        Ok(())
    }

    fn delete(&mut self, path: &str) -> Result<(), ContainerError> {
        if !self.has(path) {
            return Err(ContainerError::NotFound {
                path: path.to_string(),
            });
        }
        let prefix = format!("{path}/");
        self.objects
            .retain(|k, _| k != path && !k.starts_with(&prefix));
        Ok(())
    }

    fn root_keys(&self) -> Vec<String> {
        let mut out = Vec::new();
        for key in self.objects.keys() {
            let top = key.split('/').next().unwrap_or(key);
            if !out.iter().any(|c| c == top) {
                out.push(top.to_string());
            }
        }
        out
    }
}

/// A named collection of [`MemContainer`]s, standing in for the
/// working directory of a run.
#[derive(Clone, Debug, Default)]
pub struct MemStore {
    containers: IndexMap<String, MemContainer>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pre-built container under the given name.
    pub fn insert(&mut self, name: impl Into<String>, container: MemContainer) {
        self.containers.insert(name.into(), container);
    }

    /// Direct access for assertions on link targets.
    pub fn mem(&self, name: &str) -> Option<&MemContainer> {
        self.containers.get(name)
    }
}

impl ContainerStore for MemStore {
    fn exists(&self, name: &str) -> bool {
        self.containers.contains_key(name)
    }

    fn get(&self, name: &str) -> Result<&dyn Container, ContainerError> {
        self.containers
            .get(name)
            .map(|c| c as &dyn Container)
            .ok_or_else(|| ContainerError::NotFound {
                path: name.to_string(),
            })
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut dyn Container, ContainerError> {
        self.containers
            .get_mut(name)
            .map(|c| c as &mut dyn Container)
            .ok_or_else(|| ContainerError::NotFound {
                path: name.to_string(),
            })
    }

    fn create(&mut self, name: &str) -> Result<&mut dyn Container, ContainerError> {
        if self.containers.contains_key(name) {
            return Err(ContainerError::AlreadyExists {
                path: name.to_string(),
            });
        }
        self.containers
            .insert(name.to_string(), MemContainer::new());
        Ok(self.containers.get_mut(name).expect("just inserted"))
    }
}
