//! Template resolution, compilation, and rendering.
//!
//! Resolution merges a template with its `extends` ancestor by markdown
//! section: the ancestor's body is the scaffold, and each `## `-headed
//! child section overrides the same-named ancestor section or is
//! appended. `includes` bodies are concatenated ahead of the merged body
//! in declared order. Compilation turns the resolved body into a
//! minijinja environment; rendering is pure with respect to its inputs.

mod codes;

use minijinja::{Environment, Value};
use serde_json::json;
use tracing::debug;

use faultline_core::{RenderError, TemplateError};

use crate::store::{TemplateMeta, TemplateStore};

pub use codes::describe_error_code;

/// Name of the built-in fallback template.
pub const GENERAL_NAME: &str = faultline_core::constants::GENERAL_TEMPLATE_NAME;

/// Minimal built-in report used when a requested template is missing or
/// fails to compile. Must render non-empty even with an empty context.
const GENERAL_BODY: &str = r#"## Debug Report

{% if error_text %}Error input:
{{ error_text }}
{% else %}No error text was provided.
{% endif %}
{% if error_codes %}Error codes: {% for code in error_codes %}{{ code }} ({{ code | describe_code }}){% if not loop.last %}, {% endif %}{% endfor %}
{% endif %}
## Next Steps

Use the `{{ recommended_agent | default("general-purpose") }}` agent to investigate this error.
"#;

/// A fully merged template body, ready to compile.
#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
    /// The name the caller asked for (not the `user.`-prefixed key).
    pub name: String,
    pub version: u64,
    pub body: String,
    pub meta: TemplateMeta,
    /// Diagnostics collected during resolution (missing parents or
    /// includes); surfaced in verbose renders.
    pub notes: Vec<String>,
}

/// A compiled rendering unit.
pub struct CompiledReport {
    pub name: String,
    pub version: u64,
    meta: TemplateMeta,
    notes: Vec<String>,
    env: Environment<'static>,
}

/// The built-in fallback, resolved form.
pub fn general_resolved() -> ResolvedTemplate {
    ResolvedTemplate {
        name: GENERAL_NAME.to_string(),
        version: 0,
        body: GENERAL_BODY.to_string(),
        meta: TemplateMeta {
            display_name: Some("General Debug Report".to_string()),
            category: Some("general".to_string()),
            agent: Some("general-purpose".to_string()),
            language: Some("en".to_string()),
            ..Default::default()
        },
        notes: Vec::new(),
    }
}

/// Ancestor/include chains deeper than this indicate a cycle the store
/// failed to break.
const MAX_RESOLVE_DEPTH: usize = 32;

/// Merge the named template with its ancestor chain and includes.
///
/// Deterministic: repeated calls with an unchanged store return
/// byte-identical bodies. Bounded even on malformed input: the store
/// breaks dependency cycles at load time, and a depth guard backstops
/// that invariant.
pub fn resolve(store: &TemplateStore, name: &str) -> Result<ResolvedTemplate, TemplateError> {
    resolve_at(store, name, 0)
}

fn resolve_at(
    store: &TemplateStore,
    name: &str,
    depth: usize,
) -> Result<ResolvedTemplate, TemplateError> {
    if depth > MAX_RESOLVE_DEPTH {
        return Err(TemplateError::Cycle {
            name: name.to_string(),
        });
    }
    let template = store.get(name).ok_or_else(|| TemplateError::NotFound {
        name: name.to_string(),
    })?;

    let mut notes = Vec::new();
    let mut body = template.body.clone();
    let mut meta = template.meta.clone();

    if let Some(parent_name) = &template.extends {
        match resolve_at(store, parent_name, depth + 1) {
            Ok(parent) => {
                notes.extend(parent.notes);
                body = merge_sections(&parent.body, &body);
                meta = inherit_meta(parent.meta, meta);
            }
            Err(TemplateError::NotFound { .. }) => {
                notes.push(format!("parent template '{parent_name}' not found"));
            }
            Err(e) => return Err(e),
        }
    }

    let mut ahead: Vec<String> = Vec::new();
    for include_name in &template.includes {
        match resolve_at(store, include_name, depth + 1) {
            Ok(included) => {
                notes.extend(included.notes);
                ahead.push(included.body);
            }
            Err(TemplateError::NotFound { .. }) => {
                notes.push(format!("include template '{include_name}' not found"));
            }
            Err(e) => return Err(e),
        }
    }
    if !ahead.is_empty() {
        body = format!("{}\n{}", ahead.join("\n"), body);
    }

    Ok(ResolvedTemplate {
        name: name.to_string(),
        version: template.version,
        body,
        meta,
        notes,
    })
}

/// Child metadata fields win where present; ancestor fields fill gaps.
fn inherit_meta(parent: TemplateMeta, child: TemplateMeta) -> TemplateMeta {
    TemplateMeta {
        display_name: child.display_name.or(parent.display_name),
        description: child.description.or(parent.description),
        category: child.category.or(parent.category),
        agent: child.agent.or(parent.agent),
        language: child.language.or(parent.language),
        tags: if child.tags.is_empty() {
            parent.tags
        } else {
            child.tags
        },
    }
}

/// Split a body into its preamble and `## `-headed sections.
fn split_sections(body: &str) -> (String, Vec<(String, String)>) {
    let mut preamble = String::new();
    let mut sections: Vec<(String, String)> = Vec::new();
    for line in body.lines() {
        if let Some(title) = line.strip_prefix("## ") {
            sections.push((title.trim().to_string(), format!("{line}\n")));
        } else if let Some((_, content)) = sections.last_mut() {
            content.push_str(line);
            content.push('\n');
        } else {
            preamble.push_str(line);
            preamble.push('\n');
        }
    }
    (preamble, sections)
}

/// Ancestor scaffold with child sections merged in. Same-named child
/// sections replace the ancestor's; new sections are appended in child
/// order. A non-empty child preamble replaces the ancestor's.
fn merge_sections(ancestor: &str, child: &str) -> String {
    let (parent_pre, mut sections) = split_sections(ancestor);
    let (child_pre, child_sections) = split_sections(child);

    for (title, content) in child_sections {
        match sections.iter_mut().find(|(t, _)| *t == title) {
            Some((_, existing)) => *existing = content,
            None => sections.push((title, content)),
        }
    }

    let preamble = if child_pre.trim().is_empty() {
        parent_pre
    } else {
        child_pre
    };

    let mut merged = preamble;
    for (_, content) in sections {
        merged.push_str(&content);
    }
    merged
}

/// Compile a resolved body. A syntax error is reported against the
/// template name and recovered by the caller via the general fallback.
pub fn compile(resolved: &ResolvedTemplate) -> Result<CompiledReport, TemplateError> {
    let mut env = Environment::new();
    env.add_filter("describe_code", codes::describe_code_filter);
    env.add_template_owned(resolved.name.clone(), resolved.body.clone())
        .map_err(|e| TemplateError::Syntax {
            name: resolved.name.clone(),
            message: e.to_string(),
        })?;

    Ok(CompiledReport {
        name: resolved.name.clone(),
        version: resolved.version,
        meta: resolved.meta.clone(),
        notes: resolved.notes.clone(),
        env,
    })
}

impl CompiledReport {
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Render against `context`, with the template's own metadata injected
    /// under `_template`. When the context sets `verbose` truthy, notes
    /// collected during resolution are appended as a visible footer.
    pub fn render(
        &self,
        context: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, RenderError> {
        let mut context = context.clone();
        context.insert(
            "_template".to_string(),
            json!({
                "name": self.name,
                "version": format!("{:016x}", self.version),
                "agent": self.meta.agent.as_deref().unwrap_or("general-purpose"),
                "language": self.meta.language.as_deref().unwrap_or("en"),
            }),
        );

        let verbose = context
            .get("verbose")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        let template = self
            .env
            .get_template(&self.name)
            .map_err(|e| RenderError::Render {
                name: self.name.clone(),
                message: e.to_string(),
            })?;
        let mut output = template
            .render(Value::from_serialize(&context))
            .map_err(|e| RenderError::Render {
                name: self.name.clone(),
                message: e.to_string(),
            })?;

        if verbose && !self.notes.is_empty() {
            output.push_str("\n---\nNotes:\n");
            for note in &self.notes {
                output.push_str("- ");
                output.push_str(note);
                output.push('\n');
            }
        }

        debug!(name = %self.name, bytes = output.len(), "rendered report");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn store_with(files: &[(&str, &str)]) -> (tempfile::TempDir, TemplateStore) {
        let dir = tempfile::tempdir().unwrap();
        for (name, yaml) in files {
            fs::write(dir.path().join(format!("{name}.yaml")), yaml).unwrap();
        }
        let store = TemplateStore::load_all(&[dir.path().to_path_buf()], None);
        (dir, store)
    }

    #[test]
    fn test_section_merge_overrides_and_appends() {
        let ancestor = "intro\n## Alpha\nparent alpha\n## Beta\nparent beta\n";
        let child = "## Beta\nchild beta\n## Gamma\nchild gamma\n";
        let merged = merge_sections(ancestor, child);
        assert!(merged.starts_with("intro\n"));
        assert!(merged.contains("parent alpha"));
        assert!(merged.contains("child beta"));
        assert!(!merged.contains("parent beta"));
        // Appended after the ancestor's sections.
        assert!(merged.ends_with("## Gamma\nchild gamma\n"));
    }

    #[test]
    fn test_child_preamble_replaces_ancestor_preamble() {
        let merged = merge_sections("old intro\n## A\nbody\n", "new intro\n");
        assert!(merged.starts_with("new intro\n"));
        assert!(!merged.contains("old intro"));
        assert!(merged.contains("## A"));
    }

    #[test]
    fn test_resolve_with_extends_and_includes() {
        let (_dir, store) = store_with(&[
            (
                "base",
                "agent: debug-specialist\ntemplate: |\n  ## Summary\n  scaffold summary\n  ## Steps\n  scaffold steps\n",
            ),
            (
                "typescript",
                "extends: base\nincludes: [header]\ncategory: typescript\ntemplate: |\n  ## Steps\n  check the types\n",
            ),
            ("header", "template: |\n  # Faultline Report\n"),
        ]);
        let resolved = resolve(&store, "typescript").unwrap();
        assert!(resolved.body.starts_with("# Faultline Report"));
        assert!(resolved.body.contains("scaffold summary"));
        assert!(resolved.body.contains("check the types"));
        assert!(!resolved.body.contains("scaffold steps"));
        // Metadata inherited from the ancestor where the child is silent.
        assert_eq!(resolved.meta.agent.as_deref(), Some("debug-specialist"));
        assert_eq!(resolved.meta.category.as_deref(), Some("typescript"));
        assert!(resolved.notes.is_empty());
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let (_dir, store) = store_with(&[
            ("base", "template: |\n  ## A\n  one\n"),
            ("child", "extends: base\ntemplate: |\n  ## B\n  two\n"),
        ]);
        let first = resolve(&store, "child").unwrap();
        let second = resolve(&store, "child").unwrap();
        assert_eq!(first.body, second.body);
    }

    #[test]
    fn test_missing_parent_is_note_not_error() {
        let (_dir, store) = store_with(&[("orphan", "extends: ghost\ntemplate: body\n")]);
        let resolved = resolve(&store, "orphan").unwrap();
        assert_eq!(resolved.notes.len(), 1);
        assert!(resolved.notes[0].contains("ghost"));
        assert!(resolved.body.contains("body"));
    }

    #[test]
    fn test_missing_template_is_not_found() {
        let store = TemplateStore::load_all(&[PathBuf::from("/nonexistent")], None);
        assert!(matches!(
            resolve(&store, "nope"),
            Err(TemplateError::NotFound { .. })
        ));
    }

    #[test]
    fn test_general_renders_non_empty_with_empty_context() {
        let compiled = compile(&general_resolved()).unwrap();
        let output = compiled.render(&serde_json::Map::new()).unwrap();
        assert!(!output.trim().is_empty());
        assert!(output.contains("Debug Report"));
        assert!(output.contains("general-purpose"));
    }

    #[test]
    fn test_render_injects_template_metadata() {
        let (_dir, store) = store_with(&[(
            "meta",
            "agent: debug-specialist\nlanguage: en\ntemplate: |\n  rendered by {{ _template.agent }} v{{ _template.version }}\n",
        )]);
        let compiled = compile(&resolve(&store, "meta").unwrap()).unwrap();
        let output = compiled.render(&serde_json::Map::new()).unwrap();
        assert!(output.contains("rendered by debug-specialist"));
    }

    #[test]
    fn test_render_is_pure() {
        let compiled = compile(&general_resolved()).unwrap();
        let mut context = serde_json::Map::new();
        context.insert("error_text".to_string(), "boom".into());
        let a = compiled.render(&context).unwrap();
        let b = compiled.render(&context).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_syntax_error_is_structured() {
        let resolved = ResolvedTemplate {
            name: "broken".to_string(),
            version: 1,
            body: "{% if unclosed %}".to_string(),
            meta: TemplateMeta::default(),
            notes: Vec::new(),
        };
        let err = match compile(&resolved) {
            Ok(_) => panic!("expected a syntax error"),
            Err(e) => e,
        };
        match err {
            TemplateError::Syntax { name, .. } => assert_eq!(name, "broken"),
            other => panic!("expected syntax error, got {other}"),
        }
    }

    #[test]
    fn test_verbose_appends_notes() {
        let mut resolved = general_resolved();
        resolved.notes.push("parent template 'x' not found".to_string());
        let compiled = compile(&resolved).unwrap();

        let mut context = serde_json::Map::new();
        context.insert("verbose".to_string(), true.into());
        let verbose = compiled.render(&context).unwrap();
        assert!(verbose.contains("Notes:"));
        assert!(verbose.contains("'x' not found"));

        let quiet = compiled.render(&serde_json::Map::new()).unwrap();
        assert!(!quiet.contains("Notes:"));
    }
}
