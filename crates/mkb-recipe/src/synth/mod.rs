//! Sub-build configuration synthesis.
//!
//! The emitted file extends the scaffolded config and layers on, in order:
//! inherited eggs and develop paths, unsectioned extra options, the extra
//! parts copied from the parent (with their extra options), and finally the
//! remaining extra-options sections.

use camino::{Utf8Path, Utf8PathBuf};
use mkb_config::ExtraOptionsTree;
use mkb_core::error::MkbError;
use mkb_core::types::{ParentConfig, RecipeOptions, DEFAULT_BUILDOUT_FILE};
use mkb_core::utils::{develop_path, PathRewriter};
use tracing::{debug, info};

use crate::RecipeResult;

/// Indentation of list entries
const INDENT: &str = "   ";

/// Renders and writes the sub-build configuration
pub struct Synthesizer<'a> {
    options: &'a RecipeOptions,
    parent: &'a ParentConfig,
    developed_eggs: &'a [String],
    rewriter: &'a PathRewriter,
}

impl<'a> Synthesizer<'a> {
    /// Create a synthesizer for one part's options
    pub fn new(
        options: &'a RecipeOptions,
        parent: &'a ParentConfig,
        developed_eggs: &'a [String],
        rewriter: &'a PathRewriter,
    ) -> Self {
        Self {
            options,
            parent,
            developed_eggs,
            rewriter,
        }
    }

    /// Configuration text for the sub-build
    pub fn render(&self) -> RecipeResult<String> {
        let mut extra = ExtraOptionsTree::parse(&self.options.extra_options);
        let mut out = String::new();

        out.push_str("[buildout]\n");
        out.push_str(&format!("extends = {}\n", self.options.extends_target()));

        let eggs: Vec<&str> = self
            .developed_eggs
            .iter()
            .chain(self.options.extra_eggs.iter())
            .map(String::as_str)
            .collect();
        if !eggs.is_empty() {
            push_list(&mut out, "eggs+", eggs);
        }

        if !self.developed_eggs.is_empty() {
            let directory = self.parent.directory()?;
            let paths: Vec<String> = self
                .developed_eggs
                .iter()
                .map(|egg| develop_path(directory, egg).into_string())
                .collect();
            push_list(&mut out, "develop+", paths.iter().map(String::as_str));
        }

        for line in extra.buildout_lines() {
            out.push_str(line);
            out.push('\n');
        }

        if !self.options.extra_parts.is_empty() {
            push_list(
                &mut out,
                "parts+",
                self.options.extra_parts.iter().map(String::as_str),
            );

            for part in &self.options.extra_parts {
                self.push_part(&mut out, part, extra.take(part))?;
            }
        }

        for (section, lines) in extra.sections() {
            out.push_str(&format!("\n[{}]\n", section));
            self.push_raw_lines(&mut out, lines);
        }

        Ok(out)
    }

    /// Move the scaffolded default config aside so the new one can extend it.
    ///
    /// Only applies when the configured file is the default name, and only
    /// once: an existing rename target is left alone.
    pub async fn prepare_extends(&self, sub_build: &Utf8Path) -> RecipeResult<()> {
        if !self.options.extends_renamed_base() {
            return Ok(());
        }

        let renamed = sub_build.join(&self.options.buildout_rename);
        if renamed.exists() {
            debug!(%renamed, "base config already renamed");
            return Ok(());
        }

        let original = sub_build.join(&self.options.buildout_file);
        tokio::fs::rename(&original, &renamed).await.map_err(|e| {
            MkbError::io(format!("Failed to rename {} to {}", original, renamed), e)
        })?;
        info!("renamed {} to {}", original, renamed);
        Ok(())
    }

    /// Prepare the extends target and overwrite the sub-build config
    pub async fn write(&self, sub_build: &Utf8Path) -> RecipeResult<Utf8PathBuf> {
        self.prepare_extends(sub_build).await?;

        let text = self.render()?;
        let target = sub_build.join(DEFAULT_BUILDOUT_FILE);
        tokio::fs::write(&target, text)
            .await
            .map_err(|e| MkbError::io(format!("Failed to write {}", target), e))?;

        info!("wrote {}", target);
        Ok(target)
    }

    fn push_part(
        &self,
        out: &mut String,
        part: &str,
        extra_lines: Option<Vec<String>>,
    ) -> RecipeResult<()> {
        let section = self
            .parent
            .section(part)
            .ok_or_else(|| MkbError::UnknownSection {
                section: part.to_string(),
            })?;

        out.push_str(&format!("\n[{}]\n", part));

        for (key, value) in section {
            if value.trim().is_empty() {
                continue;
            }

            if value.contains('\n') {
                let entries: Vec<String> = value
                    .split('\n')
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(|line| self.rewriter.rewrite(line))
                    .collect();
                push_list(out, key, entries.iter().map(String::as_str));
            } else {
                out.push_str(&format!("{} = {}\n", key, self.rewriter.rewrite(value.trim())));
            }
        }

        if let Some(lines) = extra_lines {
            self.push_raw_lines(out, &lines);
        }

        Ok(())
    }

    fn push_raw_lines(&self, out: &mut String, lines: &[String]) {
        for line in lines {
            out.push_str(&self.rewriter.rewrite(line));
            out.push('\n');
        }
    }
}

/// `key=` followed by one indented entry per line
fn push_list<'s>(out: &mut String, key: &str, entries: impl IntoIterator<Item = &'s str>) {
    out.push_str(key);
    out.push_str("=\n");
    for entry in entries {
        out.push_str(INDENT);
        out.push_str(entry);
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mkb_config::parent_config_from_str;
    use mkb_core::types::OptionSet;

    const PARENT: &str = "[buildout]
directory = /root
parts-directory = /root/parts
develop = src/mod1

[P]
key1 =
    a
    b
key2 = x
key3 =
location = /root/var/filestorage

[Q]
recipe = plone.recipe.zope2instance
";

    fn options(pairs: &[(&str, &str)]) -> RecipeOptions {
        let mut set = OptionSet::with_defaults();
        for (name, value) in pairs {
            set.insert(name, value.to_string());
        }
        RecipeOptions::from_option_set(&set)
    }

    fn render(options: &RecipeOptions, eggs: &[String]) -> String {
        let parent = parent_config_from_str(PARENT, Utf8Path::new("/root")).unwrap();
        let rewriter = PathRewriter::for_part(&parent, "sub").unwrap();
        Synthesizer::new(options, &parent, eggs, &rewriter)
            .render()
            .unwrap()
    }

    #[test]
    fn test_eggs_and_develop_blocks() {
        let options = options(&[("extra_eggs", "pkg1")]);
        let text = render(&options, &["mod1".to_string()]);

        assert!(text.starts_with("[buildout]\nextends = buildout_base.cfg\n"));
        assert!(text.contains("eggs+=\n   mod1\n   pkg1\n"));
        assert!(text.contains("develop+=\n   /root/src/mod1\n"));
        assert!(!text.contains("parts+="));
    }

    #[test]
    fn test_no_eggs_no_blocks() {
        let text = render(&options(&[]), &[]);
        assert_eq!(text, "[buildout]\nextends = buildout_base.cfg\n");
    }

    #[test]
    fn test_extra_eggs_only_skip_develop() {
        let text = render(&options(&[("extra_eggs", "pkg1\npkg2")]), &[]);
        assert!(text.contains("eggs+=\n   pkg1\n   pkg2\n"));
        assert!(!text.contains("develop+="));
    }

    #[test]
    fn test_custom_buildout_file_extended_verbatim() {
        let text = render(&options(&[("buildout_file", "development.cfg")]), &[]);
        assert!(text.starts_with("[buildout]\nextends = development.cfg\n"));
    }

    #[test]
    fn test_extra_part_copied_and_rewritten() {
        let options = options(&[("extra_parts", "P")]);
        let text = render(&options, &[]);

        assert!(text.contains("parts+=\n   P\n"));
        assert!(text.contains("\n[P]\nkey1=\n   a\n   b\nkey2 = x\n"));
        assert!(!text.contains("key3"));
        assert!(text.contains("location = /root/parts/sub/var/filestorage\n"));
    }

    #[test]
    fn test_extra_options_placement() {
        let options = options(&[
            ("extra_parts", "P"),
            (
                "extra_options",
                "newest = false\n[P]\npath = /root/var\n[instance]\nhttp-address = 8080\nlog = /root/var/log\n",
            ),
        ]);
        let text = render(&options, &[]);

        let expected = "[buildout]
extends = buildout_base.cfg
newest = false
parts+=
   P

[P]
key1=
   a
   b
key2 = x
location = /root/parts/sub/var/filestorage
path = /root/parts/sub/var

[instance]
http-address = 8080
log = /root/parts/sub/var/log
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_buildout_extra_lines_not_rewritten() {
        let text = render(&options(&[("extra_options", "eggs-directory = /root/eggs")]), &[]);
        assert!(text.contains("\neggs-directory = /root/eggs\n"));
    }

    #[tokio::test]
    async fn test_write_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sub_build = Utf8Path::from_path(temp_dir.path()).unwrap();
        tokio::fs::write(sub_build.join("buildout.cfg"), "[buildout]\nparts =\n")
            .await
            .unwrap();

        let parent = parent_config_from_str(PARENT, Utf8Path::new("/root")).unwrap();
        let rewriter = PathRewriter::for_part(&parent, "sub").unwrap();
        let options = options(&[("extra_eggs", "pkg1"), ("extra_parts", "P")]);
        let eggs = vec!["mod1".to_string()];
        let synthesizer = Synthesizer::new(&options, &parent, &eggs, &rewriter);

        let target = synthesizer.write(sub_build).await.unwrap();
        let first = tokio::fs::read_to_string(&target).await.unwrap();
        let base = tokio::fs::read_to_string(sub_build.join("buildout_base.cfg"))
            .await
            .unwrap();
        assert_eq!(base, "[buildout]\nparts =\n");

        synthesizer.write(sub_build).await.unwrap();
        let second = tokio::fs::read_to_string(&target).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_scaffold_config_fails_rename() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sub_build = Utf8Path::from_path(temp_dir.path()).unwrap();

        let parent = parent_config_from_str(PARENT, Utf8Path::new("/root")).unwrap();
        let rewriter = PathRewriter::for_part(&parent, "sub").unwrap();
        let options = options(&[]);
        let synthesizer = Synthesizer::new(&options, &parent, &[], &rewriter);

        let err = synthesizer.write(sub_build).await.unwrap_err();
        assert!(matches!(err, MkbError::Io { .. }));
    }
}
