//! Unit tests for CLI commands.

use super::*;
use camino::Utf8Path;
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

const PARENT: &str = "[buildout]
parts = sub

[sub]
recipe = zest.recipe.mk_buildout
extra_eggs = pkg1
";

/// Temp directory holding a parent buildout.cfg
fn create_project() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    fs::write(temp_dir.path().join("buildout.cfg"), PARENT).unwrap();
    temp_dir
}

fn create_test_context(temp_dir: &TempDir, args: RecipeArgs) -> CommandContext {
    let cwd = Utf8Path::from_path(temp_dir.path()).unwrap().to_path_buf();
    CommandContext::new(cwd, args, None)
}

#[test]
fn test_suggest_similar_command() {
    assert_eq!(suggest_similar_command("install"), Some("install"));
    assert_eq!(suggest_similar_command("instal"), Some("install"));
    assert_eq!(suggest_similar_command("updat"), Some("update"));
    assert_eq!(suggest_similar_command("rendr"), Some("render"));
    assert_eq!(suggest_similar_command("tst"), Some("test"));

    assert_eq!(suggest_similar_command("xyz"), None);
    assert_eq!(suggest_similar_command("completely-different"), None);
}

#[test]
fn test_edit_distance() {
    assert_eq!(edit_distance("", ""), 0);
    assert_eq!(edit_distance("", "abc"), 3);
    assert_eq!(edit_distance("abc", ""), 3);
    assert_eq!(edit_distance("abc", "abc"), 0);
    assert_eq!(edit_distance("abc", "abcd"), 1);
    assert_eq!(edit_distance("check", "chekc"), 2);
    assert_eq!(edit_distance("kitten", "sitting"), 3);
}

#[tokio::test]
async fn test_load_recipe_layers_cli_over_part() {
    let temp_dir = create_project();
    let ctx = create_test_context(
        &temp_dir,
        RecipeArgs {
            set: vec!["extra_eggs+=pkg2".to_string(), "template=zope".to_string()],
            ..RecipeArgs::default()
        },
    );

    let recipe = ctx.load_recipe("sub").await.unwrap();
    assert_eq!(recipe.name(), "sub");
    assert_eq!(recipe.options().get("extra_eggs"), Some("pkg1\npkg2"));
    assert_eq!(recipe.options().get("template"), Some("zope"));
    assert_eq!(recipe.options().get("python"), Some("python"));
}

#[tokio::test]
async fn test_load_recipe_uses_settings_under_part() {
    let temp_dir = create_project();
    let cwd = Utf8Path::from_path(temp_dir.path()).unwrap().to_path_buf();
    let settings = GlobalSettings {
        options: BTreeMap::from([
            ("paster".to_string(), "/opt/bin/paster".to_string()),
            ("extra_eggs".to_string(), "from-settings".to_string()),
        ]),
        log: None,
    };
    let ctx = CommandContext::new(cwd, RecipeArgs::default(), Some(settings));

    let recipe = ctx.load_recipe("sub").await.unwrap();
    assert_eq!(recipe.options().get("paster"), Some("/opt/bin/paster"));
    assert_eq!(recipe.options().get("extra_eggs"), Some("pkg1"));
}

#[tokio::test]
async fn test_load_recipe_explicit_config() {
    let temp_dir = create_project();
    fs::create_dir(temp_dir.path().join("etc")).unwrap();
    fs::write(
        temp_dir.path().join("etc/site.cfg"),
        "[buildout]\nparts = other\n[other]\nextra_parts =\n",
    )
    .unwrap();

    let ctx = create_test_context(
        &temp_dir,
        RecipeArgs {
            config: Some("etc/site.cfg".into()),
            ..RecipeArgs::default()
        },
    );

    assert!(ctx.load_recipe("other").await.is_ok());
    let err = ctx.load_recipe("sub").await.unwrap_err();
    assert!(matches!(err, MkbError::UnknownSection { ref section } if section == "sub"));
}

#[tokio::test]
async fn test_load_recipe_missing_config() {
    let temp_dir = create_project();
    let ctx = create_test_context(
        &temp_dir,
        RecipeArgs {
            config: Some("missing.cfg".into()),
            ..RecipeArgs::default()
        },
    );

    let err = ctx.load_recipe("sub").await.unwrap_err();
    assert!(matches!(err, MkbError::ConfigValidation { ref field, .. } if field == "config"));
}

#[tokio::test]
async fn test_load_recipe_rejects_malformed_override() {
    let temp_dir = create_project();
    let ctx = create_test_context(
        &temp_dir,
        RecipeArgs {
            set: vec!["no-equals-sign".to_string()],
            ..RecipeArgs::default()
        },
    );

    let err = ctx.load_recipe("sub").await.unwrap_err();
    assert!(matches!(err, MkbError::ConfigValidation { ref field, .. } if field == "--set"));
}

#[tokio::test]
async fn test_unknown_command_is_an_error() {
    let temp_dir = create_project();
    let ctx = create_test_context(&temp_dir, RecipeArgs::default());

    let result = dispatch_command(Commands::External(vec!["instal".to_string()]), &ctx).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_show_version_and_help() {
    let temp_dir = create_project();
    let ctx = create_test_context(&temp_dir, RecipeArgs::default());

    assert!(show_version(&ctx).await.is_ok());
    assert!(show_help(&ctx).await.is_ok());
}

#[cfg(unix)]
#[tokio::test]
async fn test_render_does_not_write() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = create_project();
    let tools = temp_dir.path().join("tools");
    fs::create_dir(&tools).unwrap();

    let scripts = [
        (
            "python",
            "#!/bin/sh\necho \"usage: python [option] ... [-c cmd | -m mod | file | -] [arg] ...\"\n",
        ),
        (
            "paster",
            "#!/bin/sh\necho \"paster [paster_options] COMMAND [command_options]\"\necho \"  plone:  Plone\"\n",
        ),
    ];
    for (name, body) in scripts {
        let path = tools.join(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    let ctx = create_test_context(
        &temp_dir,
        RecipeArgs {
            set: vec![
                format!("python={}", tools.join("python").display()),
                format!("paster={}", tools.join("paster").display()),
            ],
            ..RecipeArgs::default()
        },
    );

    render::execute("sub", &ctx).await.unwrap();
    check::execute("sub", &ctx).await.unwrap();
    assert!(!temp_dir.path().join("parts").exists());
}
