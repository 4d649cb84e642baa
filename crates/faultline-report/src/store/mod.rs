//! Template store.
//!
//! Templates live in YAML files; the file stem is the template's key.
//! Directories are loaded in order with later directories shadowing
//! earlier ones, and templates from the user directory get a `user.`
//! prefix so they can shadow built-ins without deleting them. Each
//! template carries an xxh3 content hash as its version; dependency
//! edges (`extends`/`includes`) are checked for cycles at load time.

use std::path::{Path, PathBuf};

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;
use xxhash_rust::xxh3::xxh3_64;

use faultline_core::constants::USER_NAMESPACE;
use faultline_core::TemplateError;

/// On-disk template definition. Unknown keys are ignored so template
/// authors can annotate files freely.
#[derive(Debug, Clone, Default, Deserialize)]
struct TemplateFile {
    /// Human-readable display name; the key stays the file stem.
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    agent: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    includes: Vec<String>,
    #[serde(default)]
    template: String,
}

/// Metadata carried alongside a template body.
#[derive(Debug, Clone, Default)]
pub struct TemplateMeta {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub agent: Option<String>,
    pub language: Option<String>,
    pub tags: Vec<String>,
}

/// A loaded template.
#[derive(Debug, Clone)]
pub struct Template {
    /// Store key: the file stem, `user.`-prefixed for user templates.
    pub name: String,
    /// xxh3 hash of the raw file contents.
    pub version: u64,
    pub extends: Option<String>,
    pub includes: Vec<String>,
    pub body: String,
    pub meta: TemplateMeta,
}

/// Sorted summary row for listings.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TemplateSummary {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub category: String,
    pub agent: String,
}

/// The template registry.
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: FxHashMap<String, Template>,
    user_dir: Option<PathBuf>,
    /// Cycle notes recorded while breaking dependency cycles.
    diagnostics: Vec<String>,
}

impl TemplateStore {
    /// Walk `dirs` in order (later directories shadow earlier ones by
    /// key), then `user_dir` under the `user.` namespace. Files that fail
    /// to parse are skipped with a warning; a missing directory is not an
    /// error.
    pub fn load_all(dirs: &[PathBuf], user_dir: Option<&Path>) -> Self {
        let mut store = Self {
            templates: FxHashMap::default(),
            user_dir: user_dir.map(Path::to_path_buf),
            diagnostics: Vec::new(),
        };

        for dir in dirs {
            store.load_dir(dir, false);
        }
        if let Some(dir) = user_dir {
            store.load_dir(dir, true);
        }

        store.break_cycles();
        debug!(count = store.templates.len(), "loaded templates");
        store
    }

    fn load_dir(&mut self, dir: &Path, user: bool) {
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "template directory does not exist, skipping");
            return;
        }
        for entry in WalkDir::new(dir).into_iter().filter_map(Result::ok) {
            let path = entry.path();
            if !is_template_file(path) {
                continue;
            }
            match load_template(path, user) {
                Ok(template) => {
                    self.templates.insert(template.name.clone(), template);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unparsable template");
                }
            }
        }
    }

    /// Re-parse one file and return the names whose cached derivatives are
    /// now stale: the template itself plus its transitive dependents.
    pub fn reload(&mut self, path: &Path) -> Result<Vec<String>, TemplateError> {
        let user = self
            .user_dir
            .as_deref()
            .is_some_and(|dir| path.starts_with(dir));
        let template = load_template(path, user)?;
        let name = template.name.clone();
        self.templates.insert(name.clone(), template);
        self.break_cycles();

        let mut stale = self.dependents_closure(&name);
        debug!(name, dependents = stale.len() - 1, "reloaded template");
        // A user template not shadowed by a builtin is also cached under
        // its bare name.
        let aliases: Vec<String> = stale
            .iter()
            .filter_map(|n| n.strip_prefix(USER_NAMESPACE))
            .filter(|bare| !self.templates.contains_key(*bare))
            .map(str::to_string)
            .collect();
        stale.extend(aliases);
        stale.sort();
        Ok(stale)
    }

    /// Lookup rule: exact key first, then the `user.` namespace.
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates
            .get(name)
            .or_else(|| self.templates.get(&format!("{USER_NAMESPACE}{name}")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// The template plus everything that transitively `extends` or
    /// `includes` it. Always contains `name` itself. Dependency names are
    /// canonicalized through the lookup rule, so a reference to `base`
    /// counts as a dependent of `user.base` when only the user template
    /// exists.
    pub fn dependents_closure(&self, name: &str) -> Vec<String> {
        let mut closure = vec![name.to_string()];
        let mut i = 0;
        while i < closure.len() {
            for (key, template) in &self.templates {
                if closure.iter().any(|c| c == key) {
                    continue;
                }
                let depends = template
                    .extends
                    .iter()
                    .chain(template.includes.iter())
                    .any(|dep| {
                        self.get(dep).map(|t| t.name.as_str()) == Some(closure[i].as_str())
                    });
                if depends {
                    closure.push(key.clone());
                }
            }
            i += 1;
        }
        closure
    }

    /// Sorted metadata summaries, optionally filtered by category.
    pub fn list(&self, category: Option<&str>) -> Vec<TemplateSummary> {
        let mut rows: Vec<TemplateSummary> = self
            .templates
            .values()
            .filter(|t| category.map_or(true, |c| t.meta.category.as_deref() == Some(c)))
            .map(|t| TemplateSummary {
                name: t.name.clone(),
                display_name: t.meta.display_name.clone().unwrap_or_else(|| t.name.clone()),
                description: t.meta.description.clone().unwrap_or_default(),
                category: t.meta.category.clone().unwrap_or_else(|| "general".to_string()),
                agent: t.meta.agent.clone().unwrap_or_else(|| "general-purpose".to_string()),
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    /// Structural checks: existence, non-empty body, dangling references.
    /// Syntax is checked separately at compile time.
    pub fn validate(&self, name: &str) -> Vec<String> {
        let Some(template) = self.get(name) else {
            return vec![format!("template '{name}' not found")];
        };
        let mut errors = Vec::new();
        if template.body.trim().is_empty() {
            errors.push(format!("template '{name}' has an empty body"));
        }
        if let Some(parent) = &template.extends {
            if !self.contains(parent) {
                errors.push(format!("parent template '{parent}' not found"));
            }
        }
        for include in &template.includes {
            if !self.contains(include) {
                errors.push(format!("include template '{include}' not found"));
            }
        }
        errors
    }

    /// Break every dependency cycle by clearing the deps of the templates
    /// involved and recording a diagnostic. Resolution can then recurse
    /// freely without a visited set.
    fn break_cycles(&mut self) {
        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut nodes = FxHashMap::default();
        for name in self.templates.keys() {
            nodes.insert(name.clone(), graph.add_node(name.clone()));
        }
        for (name, template) in &self.templates {
            let from = nodes[name];
            for dep in template.extends.iter().chain(template.includes.iter()) {
                // The lookup rule makes `user.` targets reachable by base name.
                let resolved = self.get(dep).map(|t| t.name.clone());
                if let Some(to) = resolved.and_then(|r| nodes.get(&r).copied()) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        let mut cyclic: Vec<String> = Vec::new();
        for scc in tarjan_scc(&graph) {
            if scc.len() > 1 {
                cyclic.extend(scc.iter().map(|&n| graph[n].clone()));
            } else if let Some(&node) = scc.first() {
                if graph.find_edge(node, node).is_some() {
                    cyclic.push(graph[node].clone());
                }
            }
        }

        if cyclic.is_empty() {
            return;
        }
        cyclic.sort();
        let note = format!(
            "dependency cycle broken; deps cleared for: {}",
            cyclic.join(", ")
        );
        warn!(%note);
        self.diagnostics.push(note);
        for name in cyclic {
            if let Some(template) = self.templates.get_mut(&name) {
                template.extends = None;
                template.includes.clear();
            }
        }
    }
}

fn is_template_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

fn load_template(path: &Path, user: bool) -> Result<Template, TemplateError> {
    let raw = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: TemplateFile = serde_yaml::from_str(&raw).map_err(|e| TemplateError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| TemplateError::Parse {
            path: path.to_path_buf(),
            message: "file name is not valid UTF-8".to_string(),
        })?;
    let name = if user {
        format!("{USER_NAMESPACE}{stem}")
    } else {
        stem.to_string()
    };

    Ok(Template {
        name,
        version: xxh3_64(raw.as_bytes()),
        extends: file.extends,
        includes: file.includes,
        body: file.template,
        meta: TemplateMeta {
            display_name: file.name,
            description: file.description,
            category: file.category,
            agent: file.agent,
            language: file.language,
            tags: file.tags,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_template(dir: &Path, name: &str, yaml: &str) -> PathBuf {
        let path = dir.join(format!("{name}.yaml"));
        fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn test_load_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        write_template(
            dir.path(),
            "typescript",
            "category: typescript\ntemplate: |\n  ## Error\n  {{ error_text }}\n",
        );
        let store = TemplateStore::load_all(&[dir.path().to_path_buf()], None);
        assert_eq!(store.len(), 1);
        let t = store.get("typescript").unwrap();
        assert!(t.body.contains("{{ error_text }}"));
        assert_ne!(t.version, 0);
    }

    #[test]
    fn test_user_namespace_shadows_without_clobbering() {
        let builtin = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        write_template(builtin.path(), "general", "template: builtin body\n");
        write_template(user.path(), "general", "template: user body\n");

        let store =
            TemplateStore::load_all(&[builtin.path().to_path_buf()], Some(user.path()));
        assert_eq!(store.len(), 2);
        // Exact key wins over the user namespace.
        assert_eq!(store.get("general").unwrap().body.trim(), "builtin body");
        assert_eq!(store.get("user.general").unwrap().body.trim(), "user body");

        // A user-only template is reachable by base name.
        let user2 = tempfile::tempdir().unwrap();
        write_template(user2.path(), "mine", "template: custom\n");
        let store = TemplateStore::load_all(&[], Some(user2.path()));
        assert_eq!(store.get("mine").unwrap().name, "user.mine");
    }

    #[test]
    fn test_later_dirs_shadow_earlier() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        write_template(a.path(), "x", "template: from a\n");
        write_template(b.path(), "x", "template: from b\n");
        let store =
            TemplateStore::load_all(&[a.path().to_path_buf(), b.path().to_path_buf()], None);
        assert_eq!(store.get("x").unwrap().body.trim(), "from b");
    }

    #[test]
    fn test_cycle_is_broken_with_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path(), "a", "extends: b\ntemplate: body a\n");
        write_template(dir.path(), "b", "extends: a\ntemplate: body b\n");
        let store = TemplateStore::load_all(&[dir.path().to_path_buf()], None);
        assert!(store.get("a").unwrap().extends.is_none());
        assert!(store.get("b").unwrap().extends.is_none());
        assert_eq!(store.diagnostics().len(), 1);
        assert!(store.diagnostics()[0].contains("cycle"));
    }

    #[test]
    fn test_reload_returns_dependents_closure() {
        let dir = tempfile::tempdir().unwrap();
        let base = write_template(dir.path(), "base", "template: scaffold\n");
        write_template(dir.path(), "mid", "extends: base\ntemplate: mid\n");
        write_template(dir.path(), "leaf", "extends: mid\ntemplate: leaf\n");
        write_template(dir.path(), "other", "template: unrelated\n");

        let mut store = TemplateStore::load_all(&[dir.path().to_path_buf()], None);
        let before = store.get("base").unwrap().version;
        fs::write(&base, "template: new scaffold\n").unwrap();
        let stale = store.reload(&base).unwrap();
        assert_eq!(stale, vec!["base", "leaf", "mid"]);
        assert_ne!(store.get("base").unwrap().version, before);
    }

    #[test]
    fn test_reload_user_template_invalidates_base_name_dependents() {
        // `child` names its parent `base`, which only exists in the user
        // directory and so is keyed `user.base`. Editing it must still
        // mark `child` stale.
        let builtin = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        write_template(builtin.path(), "child", "extends: base\ntemplate: child body\n");
        let base = write_template(user.path(), "base", "template: scaffold\n");

        let mut store =
            TemplateStore::load_all(&[builtin.path().to_path_buf()], Some(user.path()));
        fs::write(&base, "template: new scaffold\n").unwrap();
        let stale = store.reload(&base).unwrap();
        // `base` itself appears too: lookups by bare name alias `user.base`.
        assert_eq!(stale, vec!["base", "child", "user.base"]);
    }

    #[test]
    fn test_reload_unparsable_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path(), "bad", ": not yaml [");
        let mut store = TemplateStore::load_all(&[], None);
        assert!(matches!(
            store.reload(&path),
            Err(TemplateError::Parse { .. })
        ));
    }

    #[test]
    fn test_validate_flags_dangling_refs() {
        let dir = tempfile::tempdir().unwrap();
        write_template(
            dir.path(),
            "child",
            "extends: ghost\nincludes: [phantom]\ntemplate: body\n",
        );
        let store = TemplateStore::load_all(&[dir.path().to_path_buf()], None);
        let errors = store.validate("child");
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("ghost"));
        assert!(errors[1].contains("phantom"));
        assert!(store.validate("child").len() == 2);
        assert_eq!(store.validate("missing").len(), 1);
    }

    #[test]
    fn test_list_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path(), "zeta", "category: network\ntemplate: z\n");
        write_template(dir.path(), "alpha", "category: memory\ntemplate: a\n");
        let store = TemplateStore::load_all(&[dir.path().to_path_buf()], None);
        let all = store.list(None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "alpha");
        let memory = store.list(Some("memory"));
        assert_eq!(memory.len(), 1);
        assert_eq!(memory[0].name, "alpha");
    }
}
