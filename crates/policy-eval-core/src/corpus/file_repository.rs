use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{Framework, GeneratedPolicies, PolicyKey, ReferenceRepository, ReferenceSet};

const POLICY_EXTENSION: &str = "txt";

/// Loads reference policies from `<base>/<framework_dir>/*.txt`.
pub struct FileReferenceRepository {
    base_path: PathBuf,
    cache: OnceCell<ReferenceSet>,
}

impl FileReferenceRepository {
    /// Create a repository rooted at the given directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            cache: OnceCell::new(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn load_from_disk(&self) -> Result<ReferenceSet> {
        let mut references = ReferenceSet::new();
        for framework in Framework::ALL {
            let dir = self.base_path.join(framework.dir_name());
            let texts: Vec<String> = read_policy_files(&dir)?
                .into_iter()
                .map(|(_, text)| text)
                .collect();
            if texts.is_empty() {
                continue;
            }
            info!(%framework, count = texts.len(), "loaded reference policies");
            references.insert(framework, texts);
        }
        if references.is_empty() {
            warn!(
                dir = %self.base_path.display(),
                "no reference policies found; add .txt files under nist_csf/ or iso27001/"
            );
        }
        Ok(references)
    }
}

#[async_trait::async_trait]
impl ReferenceRepository for FileReferenceRepository {
    async fn load_references(&self) -> Result<ReferenceSet> {
        let references = self.cache.get_or_try_init(|| self.load_from_disk())?;
        Ok(references.clone())
    }
}

/// Load generated policies from `<dir>/<model>/<framework_dir>/<category>.txt`.
///
/// Model names are lower-cased. When `models` is non-empty, only those models are kept.
/// A missing `dir` yields an empty result.
pub fn load_generated_policies(dir: &Path, models: &[String]) -> Result<GeneratedPolicies> {
    let mut policies = GeneratedPolicies::new();
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "generated policy directory not found");
        return Ok(policies);
    }

    let allowed: Vec<String> = models.iter().map(|m| m.trim().to_lowercase()).collect();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to list generated policies in {}", dir.display()))?;
    let mut model_dirs = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read directory entry in {}", dir.display()))?
            .path();
        if path.is_dir() {
            model_dirs.push(path);
        }
    }
    model_dirs.sort();

    for model_dir in model_dirs {
        let Some(model) = model_dir
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_lowercase)
        else {
            continue;
        };
        if !allowed.is_empty() && !allowed.contains(&model) {
            debug!(%model, "skipping model not in filter");
            continue;
        }

        let mut model_policies = BTreeMap::new();
        for framework in Framework::ALL {
            for (category, text) in read_policy_files(&model_dir.join(framework.dir_name()))? {
                model_policies.insert(PolicyKey::new(framework, category), text);
            }
        }
        policies.entry(model).or_default().extend(model_policies);
    }

    let total: usize = policies.values().map(BTreeMap::len).sum();
    info!(models = policies.len(), policies = total, "loaded generated policies");
    Ok(policies)
}

/// `(file stem, contents)` for every `.txt` file directly under `dir`, sorted by file name.
fn read_policy_files(dir: &Path) -> Result<Vec<(String, String)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("failed to list policy files in {}", dir.display()))?
    {
        let path = entry
            .with_context(|| format!("failed to read directory entry in {}", dir.display()))?
            .path();
        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some(POLICY_EXTENSION)
        {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read policy file at {}", path.display()))?;
        files.push((stem.to_string(), text));
    }
    Ok(files)
}
