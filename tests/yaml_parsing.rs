//! Integration tests for YAML parsing

mod common;

use dotrun::config::{
    environment_overlay, find_task_file_from, load_config_store, parse_task_file,
    read_task_file, validate_task_file, StepDef,
};
use dotrun::error::{ConfigError, DotrunError};
use dotrun::runner::{InputType, Step, TaskName, TaskRegistry, Value};

#[test]
fn test_parse_complete_task_file() {
    let yaml = r#"
name: my-app
usage: My test application
interpreter: ["bash", "-c"]

tasks:
  build:
    description: Build the project
    inputs:
      - name: release
        type: boolean
        default: false
    tasks:
      image:
        usage: Build the container image
        inputs:
          - name: build.artifact.digest
            short-name: tag
            argument-index: 0
        script: docker build -t app:${tag} .
      artifact:
        private: true
        steps:
          - cargo build
          - script: sha256sum target/app

  deploy.staging:
    inputs:
      - name: replicas
        type: integer
        default: 3
    steps:
      - task: build.image
        args: ["${replicas}"]
        inputs:
          release: true
"#;

    let file = parse_task_file(yaml).unwrap();

    // Validate file structure
    validate_task_file(&file).unwrap();

    // Check basic properties
    assert_eq!(file.name, Some("my-app".to_string()));
    assert_eq!(file.usage, Some("My test application".to_string()));
    assert_eq!(
        file.interpreter,
        Some(vec!["bash".to_string(), "-c".to_string()])
    );
    assert_eq!(file.tasks.len(), 2);

    // Check nested tasks
    let build = file.tasks.get("build").unwrap();
    assert_eq!(build.description, Some("Build the project".to_string()));
    assert_eq!(build.tasks.len(), 2);

    let image = build.tasks.get("image").unwrap();
    assert_eq!(image.description, Some("Build the container image".to_string()));
    assert_eq!(image.inputs[0].short_name, Some("tag".to_string()));
    assert_eq!(image.inputs[0].argument_index, Some(0));

    let artifact = build.tasks.get("artifact").unwrap();
    assert!(artifact.private);
    assert!(matches!(&artifact.steps[0], StepDef::Simple(s) if s == "cargo build"));
    assert!(matches!(&artifact.steps[1], StepDef::Script { script } if script.starts_with("sha256sum")));
}

#[test]
fn test_registry_from_task_file() {
    let yaml = r#"
tasks:
  build:
    inputs:
      - name: release
        type: boolean
        default: false
    tasks:
      image:
        script: docker build .
  deploy.staging:
    steps:
      - task: build.image
        args: ["v1"]
        inputs:
          release: true
"#;

    let registry = TaskRegistry::from_config(&parse_task_file(yaml).unwrap());

    let names: Vec<&String> = registry.tasks().keys().collect();
    assert_eq!(names, vec!["build", "build.image", "deploy", "deploy.staging"]);

    let build = registry.find_task(&TaskName::parse("build")).unwrap();
    assert_eq!(build.inputs[0].input_type, InputType::Boolean);
    assert_eq!(build.inputs[0].default, Some(Value::Boolean(false)));

    let staging = registry.find_task(&TaskName::parse("deploy.staging")).unwrap();
    match &staging.steps[0] {
        Step::Task { name, args, inputs } => {
            assert_eq!(name, "build.image");
            assert_eq!(args, &vec!["v1".to_string()]);
            assert_eq!(inputs.get("release"), Some(&Value::Boolean(true)));
        }
        other => panic!("unexpected step: {:?}", other),
    }

    // `deploy` exists only as the namespace of `deploy.staging`
    let deploy = registry.find_task(&TaskName::parse("deploy")).unwrap();
    assert!(deploy.steps.is_empty());
    assert_eq!(registry.children(&deploy.name).len(), 1);
}

#[test]
fn test_parse_minimal_task_file() {
    let file = parse_task_file("tasks:\n  hello:\n    script: echo hello\n").unwrap();
    validate_task_file(&file).unwrap();

    let hello = file.tasks.get("hello").unwrap();
    assert_eq!(hello.script, Some("echo hello".to_string()));
    assert!(hello.inputs.is_empty());
    assert!(!hello.private);
}

#[test]
fn test_parse_empty_task_file() {
    let file = parse_task_file("name: empty\n").unwrap();
    assert!(file.tasks.is_empty());
    assert!(file.interpreter.is_none());
}

#[test]
fn test_parse_invalid_yaml() {
    let result = parse_task_file("tasks:\n  - not: a map\n");
    assert!(matches!(result, Err(DotrunError::Yaml(_))));
}

#[test]
fn test_input_type_defaults_to_string() {
    let file = parse_task_file(
        r#"
tasks:
  greet:
    inputs:
      - name: who
"#,
    )
    .unwrap();

    assert_eq!(file.tasks["greet"].inputs[0].input_type, "string");
}

#[test]
fn test_validation_rejects_script_and_steps() {
    let file = parse_task_file(
        r#"
tasks:
  both:
    script: echo a
    steps:
      - echo b
"#,
    )
    .unwrap();

    assert!(matches!(
        validate_task_file(&file),
        Err(ConfigError::ScriptAndSteps(name)) if name == "both"
    ));
}

#[test]
fn test_read_task_file_from_disk() {
    let (_dir, path) = common::create_task_file("tasks:\n  hello:\n    script: echo hi\n");

    let file = read_task_file(&path).unwrap();
    assert!(file.tasks.contains_key("hello"));
}

#[test]
fn test_find_task_file_in_parent_directory() {
    let (dir, path) = common::create_task_file("tasks: {}\n");
    let sub_dir = dir.path().join("nested").join("deeper");
    std::fs::create_dir_all(&sub_dir).unwrap();

    let found = find_task_file_from(sub_dir).unwrap();
    assert_eq!(found, path);
}

#[test]
fn test_config_overlay_and_flags() {
    let (dir, _) = common::create_task_file("tasks: {}\n");
    let config_file = common::write_file(
        &dir,
        "dotrun.config.yml",
        "region: us-east-1\ndeploy:\n  replicas: 2\n  zone: a\n",
    );
    let overlay = environment_overlay(&config_file, "prod");
    assert_eq!(overlay, dir.path().join("dotrun.config.prod.yml"));
    std::fs::write(&overlay, "deploy:\n  replicas: 6\n").unwrap();

    let store = load_config_store(
        Some(&config_file),
        "prod",
        vec![("region".to_string(), "eu-west-1".to_string())],
    )
    .unwrap();

    assert_eq!(store.get("deploy.replicas"), Some(&Value::Integer(6)));
    assert_eq!(store.get("deploy.zone"), Some(&Value::from("a")));
    assert_eq!(
        store.resolve("region", &InputType::String),
        Some(Value::from("eu-west-1"))
    );

    // Without an env label the overlay is ignored
    let store = load_config_store(Some(&config_file), "", Vec::new()).unwrap();
    assert_eq!(store.get("deploy.replicas"), Some(&Value::Integer(2)));
}

#[test]
fn test_config_must_be_a_mapping() {
    let (dir, _) = common::create_task_file("tasks: {}\n");
    let config_file = common::write_file(&dir, "dotrun.config.yml", "- a\n- b\n");

    let result = load_config_store(Some(&config_file), "", Vec::new());
    assert!(matches!(
        result,
        Err(DotrunError::Config(ConfigError::Invalid(_)))
    ));
}
