use domain::markers::{Marker, MarkerEnvironment};
use domain::selection::{select_best, CompatibilityTags, SelectionError};
use domain::system::{OsType, PlatformDetector, PlatformInfo};
use sitepack_lock::Lockfile;

const LOCK: &str = r#"
lock-version = "1.0"
created-by = "selection-tests"

[[packages]]
name = "numpy"
version = "2.1.0"

[[packages.wheels]]
name = "numpy-2.1.0-cp311-abi3-manylinux_2_39_x86_64.whl"
url = "https://files.example/numpy-2.1.0-cp311-abi3-manylinux_2_39_x86_64.whl"
hashes = { sha256 = "1111111111111111111111111111111111111111111111111111111111111111" }

[[packages.wheels]]
name = "numpy-2.1.0-cp311-cp311-manylinux_2_39_x86_64.whl"
url = "https://files.example/numpy-2.1.0-cp311-cp311-manylinux_2_39_x86_64.whl"
hashes = { sha256 = "2222222222222222222222222222222222222222222222222222222222222222" }

[[packages.wheels]]
name = "numpy-2.1.0-cp312-cp312-win_amd64.whl"
url = "https://files.example/numpy-2.1.0-cp312-cp312-win_amd64.whl"
hashes = { sha256 = "3333333333333333333333333333333333333333333333333333333333333333" }

[[packages]]
name = "pywin32"
version = "306"
marker = "sys_platform == 'win32'"

[[packages.wheels]]
url = "https://files.example/pywin32-306-cp311-cp311-win_amd64.whl"
hashes = { sha256 = "4444444444444444444444444444444444444444444444444444444444444444" }

[[packages]]
name = "tomli"
version = "2.0.1"
marker = "python_version < '3.11'"

[[packages.wheels]]
url = "https://files.example/tomli-2.0.1-py3-none-any.whl"
hashes = { sha256 = "5555555555555555555555555555555555555555555555555555555555555555" }

[[packages]]
name = "six"
version = "1.16.0"

[[packages.wheels]]
url = "https://files.example/six-1.16.0-py2.py3-none-any.whl"
hashes = { sha256 = "6666666666666666666666666666666666666666666666666666666666666666" }
"#;

fn linux_cp311() -> (CompatibilityTags, MarkerEnvironment) {
    let tags = CompatibilityTags::parse(
        "cp311-cp311-manylinux_2_39_x86_64\n\
         cp311-abi3-manylinux_2_39_x86_64\n\
         cp311-none-manylinux_2_39_x86_64\n\
         py3-none-manylinux_2_39_x86_64\n\
         cp311-none-any\n\
         py3-none-any\n",
    );
    let info = PlatformInfo {
        os_type: OsType::Linux,
        os_version: "24.04".to_string(),
        machine: "x86_64".to_string(),
        kernel_version: Some("6.8.0".to_string()),
    };
    (tags, PlatformDetector::marker_environment_for(&info, "cpython3.11"))
}

#[test]
fn test_lockfile_to_selected_wheels() {
    let lock: Lockfile = LOCK.parse().unwrap();
    let (tags, env) = linux_cp311();

    let chosen: Vec<(String, String)> = lock
        .packages
        .iter()
        .filter(|p| Marker::parse(p.marker()).unwrap().evaluate(&env).unwrap())
        .map(|p| (p.name.clone(), select_best(p, &tags).unwrap().name.clone()))
        .collect();

    assert_eq!(
        chosen,
        vec![
            (
                "numpy".to_string(),
                "numpy-2.1.0-cp311-cp311-manylinux_2_39_x86_64.whl".to_string()
            ),
            ("six".to_string(), "six-1.16.0-py2.py3-none-any.whl".to_string()),
        ]
    );
}

#[test]
fn test_marker_excluded_package_has_no_compatible_wheel_either() {
    let lock: Lockfile = LOCK.parse().unwrap();
    let (tags, _) = linux_cp311();
    let pywin32 = lock.packages.iter().find(|p| p.name == "pywin32").unwrap();

    assert_eq!(
        select_best(pywin32, &tags),
        Err(SelectionError::NoCompatibleWheel("pywin32".to_string()))
    );
}

#[test]
fn test_host_environment_evaluates_common_markers() {
    let env = PlatformDetector::marker_environment("cpython3.11");
    assert_eq!(env.get("python_version"), "3.11");
    assert!(Marker::parse("python_version >= '3.8' and implementation_name == 'cpython'")
        .unwrap()
        .evaluate(&env)
        .unwrap());
}
