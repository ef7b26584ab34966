mod common;

use common::Project;
use tessera_build::BuildError;
use tessera_bundle::{BundleError, ParseCache, ParseError};
use tessera_config::{load_config, resolve_target};

const APP: &str = r#"
[project]
name = "site"
version = "1.0.0"

[targets.app]
kind = "script"
output = "dist/app.js"
entries = ["src/main.ts"]
entry_points = ["main"]
"#;

const PAGES: &str = r#"
[project]
name = "site"
version = "1.0.0"

[targets.pages]
kind = "view"
output = "dist"

[[targets.pages.views]]
source = "views/home.tmpl"
output = "dist/home.html"
controller = "src/home.ts"

[[targets.pages.views]]
source = "views/about.tmpl"
output = "dist/about.html"
controller = "src/about.ts"
"#;

const STYLES: &str = r#"
[project]
name = "site"
version = "1.0.0"

[defines]
DEBUG = "true"

[targets.styles]
kind = "stylesheet"
output = "dist/site.css"
entries = ["styles/main.css"]
"#;

fn styles() -> Project {
    let project = Project::new(STYLES);
    project.write("styles/main.css", "decl body\neffect body\n");
    project
}

fn app() -> Project {
    let project = Project::new(APP);
    project.write("src/main.ts", "import fmt util.ts fmt\ndecl main fmt\nexport main\n");
    project.write("src/util.ts", "decl fmt\nexport fmt\n");
    project
}

fn pages() -> Project {
    let project = Project::new(PAGES);
    project.write("views/home.tmpl", "decl page\nexport page\n");
    project.write("views/about.tmpl", "decl about\nexport about\n");
    project.write("src/home.ts", "decl init\nexport init\n");
    project.write("src/about.ts", "decl wire\nexport wire\n");
    project
}

#[test]
fn first_build_compiles_everything() {
    let project = app();
    let report = project.build("app").unwrap();

    assert_eq!(report.target, "app");
    assert_eq!(report.rebuilt, vec![project.path("src/main.ts")]);
    assert!(report.compiled.contains(&project.path("src/util.ts")));
    assert!(report.compiled.contains(&project.path("src/main.ts")));
    assert_eq!(project.read("dist/app.js"), "fmt = [];\nmain = [fmt];\n");
}

#[test]
fn unchanged_project_is_up_to_date() {
    let project = app();
    project.build("app").unwrap();

    let report = project.build("app").unwrap();
    assert!(report.is_up_to_date());
    assert_eq!(report.skipped, vec![project.path("src/main.ts")]);
    assert!(report.compiled.is_empty());
}

#[test]
fn modified_dependency_rebuilds_bundle() {
    let project = app();
    project.build("app").unwrap();

    project.modify("src/util.ts", "decl fmt\ndecl pad\nexport fmt\nexport pad\n");
    let report = project.build("app").unwrap();
    assert_eq!(report.rebuilt, vec![project.path("src/main.ts")]);

    // Settles again once rebuilt against the new build age.
    project.age("src/util.ts", -30);
    assert!(project.build("app").unwrap().is_up_to_date());
}

#[test]
fn changed_build_key_rebuilds_bundle() {
    let project = app();
    project.build("app").unwrap();

    project.write("tessera.toml", &APP.replace("[targets.app]", "[build]\ncompact = true\n\n[targets.app]"));
    let report = project.build("app").unwrap();
    assert!(!report.is_up_to_date());
    assert_eq!(project.read("dist/app.js"), "a = [];\nb = [a];\n");
}

#[test]
fn deleted_output_rebuilds_bundle() {
    let project = app();
    project.build("app").unwrap();

    std::fs::remove_file(project.path("dist/app.js")).unwrap();
    let report = project.build("app").unwrap();
    assert!(!report.is_up_to_date());
    assert!(project.path("dist/app.js").exists());
}

#[test]
fn force_rebuilds_fresh_bundle() {
    let project = app();
    project.build("app").unwrap();

    project.write("tessera.toml", &APP.replace("[targets.app]", "[build]\nforce = true\n\n[targets.app]"));
    assert!(!project.build("app").unwrap().is_up_to_date());
}

#[test]
fn failing_bundle_keeps_no_output_and_recovers() {
    let project = app();
    project.write("src/util.ts", "error unexpected token\n");

    let err = project.build("app").unwrap_err();
    match err {
        BuildError::Bundle {
            source: BundleError::Parse(ParseError::Syntax { path, message }),
            ..
        } => {
            assert_eq!(path, project.path("src/util.ts"));
            assert_eq!(message, "unexpected token");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!project.path("dist/app.js").exists());

    project.modify("src/util.ts", "decl fmt\nexport fmt\n");
    let report = project.build("app").unwrap();
    assert_eq!(report.rebuilt, vec![project.path("src/main.ts")]);
    assert!(project.path("dist/app.js").exists());
}

#[test]
fn missing_import_is_reported() {
    let project = app();
    std::fs::remove_file(project.path("src/util.ts")).unwrap();

    let err = project.build("app").unwrap_err();
    assert!(matches!(
        err,
        BuildError::Bundle {
            source: BundleError::UnresolvedDependency { .. },
            ..
        }
    ));
}

#[test]
fn views_build_each_root_separately() {
    let project = pages();
    let report = project.build("pages").unwrap();

    assert_eq!(
        report.rebuilt,
        vec![project.path("views/home.tmpl"), project.path("views/about.tmpl")]
    );
    assert_eq!(project.read("dist/home.html"), "init = [];\npage = [];\n");
    assert_eq!(project.read("dist/about.html"), "wire = [];\nabout = [];\n");

    let report = project.build("pages").unwrap();
    assert!(report.is_up_to_date());
    assert_eq!(report.skipped.len(), 2);
}

#[test]
fn view_rebuilds_when_its_controller_changes() {
    let project = pages();
    project.build("pages").unwrap();

    project.modify("src/home.ts", "decl init\ndecl ready\nexport init\nexport ready\n");
    let report = project.build("pages").unwrap();
    assert_eq!(report.rebuilt, vec![project.path("views/home.tmpl")]);
    assert_eq!(report.skipped, vec![project.path("views/about.tmpl")]);
}

#[test]
fn view_rebuilds_when_its_association_changes() {
    let project = pages();
    project.build("pages").unwrap();

    project.write("src/other.ts", "decl boot\nexport boot\n");
    project.write(
        "tessera.toml",
        &PAGES.replace("controller = \"src/home.ts\"", "controller = \"src/other.ts\""),
    );
    let report = project.build("pages").unwrap();
    assert_eq!(report.rebuilt, vec![project.path("views/home.tmpl")]);
    assert_eq!(report.skipped, vec![project.path("views/about.tmpl")]);
    assert_eq!(project.read("dist/home.html"), "boot = [];\npage = [];\n");
}

#[test]
fn failing_view_keeps_views_built_before_it() {
    let project = pages();
    project.write("views/about.tmpl", "error unclosed tag\n");

    let err = project.build("pages").unwrap_err();
    match &err {
        BuildError::Bundle { root, .. } => assert_eq!(root, &project.path("views/about.tmpl")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(project.path("dist/home.html").exists());
    assert!(!project.path("dist/about.html").exists());

    project.modify("views/about.tmpl", "decl about\nexport about\n");
    let report = project.build("pages").unwrap();
    assert_eq!(report.skipped, vec![project.path("views/home.tmpl")]);
    assert_eq!(report.rebuilt, vec![project.path("views/about.tmpl")]);
}

#[test]
fn deleted_view_output_rebuilds_only_that_view() {
    let project = pages();
    project.build("pages").unwrap();

    std::fs::remove_file(project.path("dist/about.html")).unwrap();
    let report = project.build("pages").unwrap();
    assert_eq!(report.rebuilt, vec![project.path("views/about.tmpl")]);
}

#[test]
fn included_view_stays_fresh_and_tracks_its_controller() {
    let config = format!(
        "{PAGES}\n[[targets.pages.views]]\nsource = \"views/page.tmpl\"\noutput = \"dist/page.html\"\ncontroller = \"src/page.ts\"\n"
    );
    let project = Project::new(&config);
    project.write("views/home.tmpl", "decl page\nexport page\n");
    project.write("views/about.tmpl", "decl about\nexport about\n");
    project.write("views/page.tmpl", "dep home.tmpl\ndecl body\nexport body\n");
    project.write("src/home.ts", "decl init\nexport init\n");
    project.write("src/about.ts", "decl wire\nexport wire\n");
    project.write("src/page.ts", "decl load\nexport load\n");
    project.build("pages").unwrap();

    // Building the page reloaded the home view without invalidating it
    let report = project.build("pages").unwrap();
    assert!(report.is_up_to_date());
    assert_eq!(report.skipped.len(), 3);

    project.modify("src/home.ts", "decl init\ndecl ready\nexport init\nexport ready\n");
    let report = project.build("pages").unwrap();
    assert!(report.rebuilt.contains(&project.path("views/home.tmpl")));
    assert!(!report.rebuilt.contains(&project.path("views/about.tmpl")));
}

#[test]
fn shared_parse_cache_reparses_only_modified_files() {
    let project = app();
    let parses = ParseCache::new();
    let builder = project.builder().with_parse_cache(&parses);
    let config = load_config(project.root()).unwrap();

    let target = resolve_target(&config, project.root(), "app").unwrap();
    builder.build(&target).unwrap();
    assert_eq!(project.frontend.parse_count(), 2);

    project.modify("src/main.ts", "import fmt util.ts fmt\ndecl main fmt fmt\nexport main\n");
    builder.build(&target).unwrap();
    assert_eq!(project.frontend.parse_count(), 3);
    assert_eq!(project.read("dist/app.js"), "fmt = [];\nmain = [fmt, fmt];\n");
}

#[test]
fn unknown_target_is_a_config_error() {
    let project = app();
    let err = project.build("missing").unwrap_err();
    assert!(matches!(err, BuildError::Config(_)));
}

#[test]
fn stylesheet_rebuilds_when_compact_changes() {
    let project = styles();
    project.build("styles").unwrap();
    assert_eq!(
        project.read("dist/site.css"),
        "const DEBUG = true;\nbody = [];\neffect(body);\n"
    );
    assert!(project.build("styles").unwrap().is_up_to_date());

    project.write("tessera.toml", &STYLES.replace("[defines]", "[build]\ncompact = true\n\n[defines]"));
    let report = project.build("styles").unwrap();
    assert_eq!(report.rebuilt, vec![project.path("styles/main.css")]);
    assert_eq!(
        project.read("dist/site.css"),
        "const DEBUG = true;\na = [];\neffect(a);\n"
    );
}

#[test]
fn stylesheet_rebuilds_when_a_define_changes() {
    let project = styles();
    project.build("styles").unwrap();

    project.write("tessera.toml", &STYLES.replace("DEBUG = \"true\"", "DEBUG = \"false\""));
    let report = project.build("styles").unwrap();
    assert!(!report.is_up_to_date());
    assert_eq!(
        project.read("dist/site.css"),
        "const DEBUG = false;\nbody = [];\neffect(body);\n"
    );
}
