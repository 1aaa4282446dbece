use nothelm::deploy::{deploy, DeployOptions, Target};
use nothelm::env::EnvSnapshot;
use nothelm::error::{Error, Result};
use nothelm::hooks::{run_deploy_hook, ScriptInvoker};
use nothelm::processor::TemplatePolicy;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Invocation {
    script: PathBuf,
    work_dir: PathBuf,
    env: EnvSnapshot,
    work_dir_listing: Vec<String>,
}

/// Records invocations instead of spawning processes.
struct FakeInvoker {
    exit_code: Option<i32>,
    calls: RefCell<Vec<Invocation>>,
}

impl FakeInvoker {
    fn exiting_with(exit_code: Option<i32>) -> Self {
        Self { exit_code, calls: RefCell::new(Vec::new()) }
    }
}

impl ScriptInvoker for FakeInvoker {
    fn invoke(&self, script: &Path, work_dir: &Path, env: &EnvSnapshot) -> Result<Option<i32>> {
        let mut work_dir_listing: Vec<String> = fs::read_dir(work_dir)?
            .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<_>>()?;
        work_dir_listing.sort();
        self.calls.borrow_mut().push(Invocation {
            script: script.to_path_buf(),
            work_dir: work_dir.to_path_buf(),
            env: env.clone(),
            work_dir_listing,
        });
        Ok(self.exit_code)
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_project() -> TempDir {
    let project = TempDir::new().unwrap();
    write(&project.path().join("values.yaml"), "name: app\n");
    write(&project.path().join("templates/app.yaml.j2"), "name: {{ name }}\n");
    write(&project.path().join("commands/deploy.sh"), "kubectl apply -f app.yaml\n");
    project
}

fn env() -> EnvSnapshot {
    [("SECRET", "abc"), ("PATH", "/usr/bin")].into_iter().collect()
}

#[test_log::test]
fn test_deploy_into_explicit_target() {
    let project = sample_project();
    let out = TempDir::new().unwrap();
    let target = out.path().join("target");
    let invoker = FakeInvoker::exiting_with(Some(0));

    let options = DeployOptions {
        project_dirs: vec![project.path().to_path_buf()],
        target_dir: Some(target.clone()),
        ..Default::default()
    };
    deploy(&options, &env(), &invoker).unwrap();

    assert_eq!(fs::read_to_string(target.join("templates/app.yaml")).unwrap(), "name: app\n");

    let calls = invoker.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].work_dir, target.join("templates"));
    assert_eq!(calls[0].script, fs::canonicalize(target.join("commands/deploy.sh")).unwrap());
    assert_eq!(calls[0].env, env());
    assert_eq!(calls[0].work_dir_listing, vec!["app.yaml".to_string()]);
}

#[test]
fn test_explicit_target_is_cleared_first() {
    let project = sample_project();
    let out = TempDir::new().unwrap();
    write(&out.path().join("stale.txt"), "old");

    let options = DeployOptions {
        project_dirs: vec![project.path().to_path_buf()],
        target_dir: Some(out.path().to_path_buf()),
        dry_run: true,
        ..Default::default()
    };
    deploy(&options, &env(), &FakeInvoker::exiting_with(Some(0))).unwrap();

    assert!(!out.path().join("stale.txt").exists());
    assert!(out.path().join("templates/app.yaml").is_file());
}

#[test]
fn test_dry_run_skips_hook() {
    let project = sample_project();
    let out = TempDir::new().unwrap();
    let invoker = FakeInvoker::exiting_with(Some(1));

    let options = DeployOptions {
        project_dirs: vec![project.path().to_path_buf()],
        target_dir: Some(out.path().join("t")),
        dry_run: true,
        ..Default::default()
    };
    deploy(&options, &env(), &invoker).unwrap();

    assert!(invoker.calls.borrow().is_empty());
}

#[test]
fn test_target_is_file() {
    let project = sample_project();
    let out = TempDir::new().unwrap();
    let file = out.path().join("file");
    write(&file, "not a directory");

    let options = DeployOptions {
        project_dirs: vec![project.path().to_path_buf()],
        target_dir: Some(file.clone()),
        ..Default::default()
    };
    let result = deploy(&options, &env(), &FakeInvoker::exiting_with(Some(0)));

    assert!(matches!(result, Err(Error::TargetIsFileError { .. })));
    assert_eq!(fs::read_to_string(file).unwrap(), "not a directory");
}

#[test]
fn test_temporary_target_is_removed_after_success_and_failure() {
    let project = sample_project();
    for (exit_code, should_fail) in [(Some(0), false), (Some(2), true), (None, true)] {
        let invoker = FakeInvoker::exiting_with(exit_code);
        let options = DeployOptions {
            project_dirs: vec![project.path().to_path_buf()],
            ..Default::default()
        };

        let result = deploy(&options, &env(), &invoker);
        assert_eq!(result.is_err(), should_fail);
        if should_fail {
            assert!(matches!(result, Err(Error::NonZeroExitError { .. })));
        }

        let calls = invoker.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].work_dir.exists());
    }
}

#[test]
fn test_missing_script() {
    let project = TempDir::new().unwrap();
    write(&project.path().join("templates/a.txt"), "a");
    let invoker = FakeInvoker::exiting_with(Some(0));

    let options =
        DeployOptions { project_dirs: vec![project.path().to_path_buf()], ..Default::default() };
    let result = deploy(&options, &env(), &invoker);

    assert!(matches!(result, Err(Error::MissingScriptError { .. })));
    assert!(invoker.calls.borrow().is_empty());
}

#[test]
fn test_override_values_apply_to_every_project() {
    let base = sample_project();
    let overlay = TempDir::new().unwrap();
    write(&overlay.path().join("values.yaml"), "name: overlay\n");
    write(&overlay.path().join("templates/extra.txt.j2"), "{{ name }}/{{ password }}");

    let values_dir = TempDir::new().unwrap();
    let secrets = values_dir.path().join("secrets.yaml.j2");
    write(&secrets, "name: forced\npassword: \"${SECRET}\"\n");

    let out = TempDir::new().unwrap();
    let options = DeployOptions {
        project_dirs: vec![base.path().to_path_buf(), overlay.path().to_path_buf()],
        target_dir: Some(out.path().to_path_buf()),
        values_files: vec![secrets],
        dry_run: true,
        policy: TemplatePolicy::default(),
    };
    deploy(&options, &env(), &FakeInvoker::exiting_with(Some(0))).unwrap();

    assert_eq!(
        fs::read_to_string(out.path().join("templates/app.yaml")).unwrap(),
        "name: forced\n"
    );
    assert_eq!(fs::read_to_string(out.path().join("templates/extra.txt")).unwrap(), "forced/abc");
}

#[test]
fn test_hook_runs_from_target_root_without_templates() {
    let target = TempDir::new().unwrap();
    write(&target.path().join("commands/deploy.sh"), "true\n");
    let invoker = FakeInvoker::exiting_with(Some(0));

    run_deploy_hook(target.path(), &invoker, &env()).unwrap();

    assert_eq!(invoker.calls.borrow()[0].work_dir, target.path());
}

#[test]
fn test_temporary_target_acquire_and_release() {
    let target = Target::acquire(None).unwrap();
    let path = target.path().to_path_buf();
    assert!(path.is_dir());
    drop(target);
    assert!(!path.exists());
}

#[cfg(unix)]
#[test]
fn test_shell_invoker_runs_rendered_script() {
    use nothelm::hooks::ShellInvoker;

    if !Path::new("/bin/bash").exists() {
        return;
    }

    let project = TempDir::new().unwrap();
    write(&project.path().join("templates/app.yaml"), "app");
    write(
        &project.path().join("commands/deploy.sh.j2"),
        "test \"$SECRET\" = abc && test -f app.yaml && echo \"{{ marker }}\" > ../deployed\n",
    );
    write(&project.path().join("values.yaml"), "marker: done\n");
    let out = TempDir::new().unwrap();

    let options = DeployOptions {
        project_dirs: vec![project.path().to_path_buf()],
        target_dir: Some(out.path().to_path_buf()),
        ..Default::default()
    };
    deploy(&options, &env(), &ShellInvoker).unwrap();
    assert_eq!(fs::read_to_string(out.path().join("deployed")).unwrap(), "done\n");

    write(&project.path().join("commands/deploy.sh.j2"), "exit 3\n");
    let result = deploy(&options, &env(), &ShellInvoker);
    assert!(matches!(result, Err(Error::NonZeroExitError { .. })));
}

#[test]
fn test_hook_receives_the_full_environment() {
    let project = sample_project();
    let process_env = EnvSnapshot::from_process();
    let invoker = FakeInvoker::exiting_with(Some(0));

    let options =
        DeployOptions { project_dirs: vec![project.path().to_path_buf()], ..Default::default() };
    deploy(&options, &process_env, &invoker).unwrap();

    let calls = invoker.calls.borrow();
    assert_eq!(calls[0].env, process_env);
    assert_eq!(calls[0].env.iter_os().count(), std::env::vars_os().count());
}

#[cfg(unix)]
#[test]
fn test_shell_invoker_passes_non_utf8_variables() {
    use nothelm::hooks::ShellInvoker;
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    if !Path::new("/bin/bash").exists() {
        return;
    }

    let target = TempDir::new().unwrap();
    write(&target.path().join("commands/deploy.sh"), "printf '%s' \"$RAW\" > raw\n");
    let env = EnvSnapshot::from_vars_os([
        (OsString::from("PATH"), OsString::from("/usr/bin:/bin")),
        (OsString::from("RAW"), OsString::from_vec(vec![b'a', 0xff])),
    ]);

    run_deploy_hook(target.path(), &ShellInvoker, &env).unwrap();

    assert_eq!(fs::read(target.path().join("raw")).unwrap(), vec![b'a', 0xff]);
}
