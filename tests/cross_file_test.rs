use std::path::{Path, PathBuf};

use structure_from_source::analyzer::{
    analyze_fastapi_app, analyze_fastapi_app_with_resolver, RouterResolver, WalkdirRouterResolver,
};
use tempfile::TempDir;

/// Helper function to create a temporary test project
fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

#[test]
fn test_routers_resolved_across_directories() {
    let temp_dir = create_test_project(vec![
        (
            "app/main.py",
            r#"
from fastapi import FastAPI

service = FastAPI()
service.include_router(orders_router, prefix="/orders")
service.include_router(billing_router, prefix="/billing")
"#,
        ),
        (
            "app/api/orders.py",
            r#"
from fastapi import APIRouter

orders_router = APIRouter()


@orders_router.get("/{order_id}")
def get_order(order_id: int):
    return {}
"#,
        ),
        (
            "app/api/billing.py",
            r#"
from fastapi import APIRouter

billing_router = APIRouter()


@billing_router.post("/charge")
def charge(amount: float):
    return {}
"#,
        ),
    ]);

    let analysis = analyze_fastapi_app(temp_dir.path(), Path::new("app/main.py"))
        .expect("Failed to analyze project");

    let paths: Vec<&str> = analysis.endpoints.iter().map(|e| e.path.as_str()).collect();
    assert!(
        paths.contains(&"/orders/{order_id}"),
        "orders router not merged, found: {:?}",
        paths
    );
    assert!(
        paths.contains(&"/billing/charge"),
        "billing router not merged, found: {:?}",
        paths
    );

    // Source files are recorded relative to the repository root
    let get_order = analysis
        .endpoints
        .iter()
        .find(|e| e.name == "get_order")
        .unwrap();
    assert!(get_order.source_file.ends_with("orders.py"));
}

#[test]
fn test_app_variable_other_than_app() {
    // The walkdir resolver keys off the discovered instance variable name
    let temp_dir = create_test_project(vec![(
        "main.py",
        r#"
service = FastAPI()


@service.get("/ping")
def ping():
    return "pong"
"#,
    )]);

    let analysis = analyze_fastapi_app(temp_dir.path(), Path::new("main.py"))
        .expect("Failed to analyze project");
    assert_eq!(analysis.endpoints.len(), 1);
    assert_eq!(analysis.endpoints[0].path, "/ping");
}

#[test]
fn test_custom_resolver_injection() {
    struct FixedResolver;
    impl RouterResolver for FixedResolver {
        fn resolve(&self, _repo_root: &Path, variable: &str) -> Option<PathBuf> {
            (variable == "users_router").then(|| PathBuf::from("elsewhere/users.py"))
        }
    }

    let temp_dir = create_test_project(vec![
        (
            "main.py",
            r#"
app = FastAPI()
app.include_router(users_router, prefix="/users")
"#,
        ),
        (
            "elsewhere/users.py",
            r#"
users_router = APIRouter()


@users_router.get("/")
def list_users():
    return []
"#,
        ),
    ]);

    let analysis =
        analyze_fastapi_app_with_resolver(temp_dir.path(), Path::new("main.py"), &FixedResolver)
            .expect("Failed to analyze project");

    assert_eq!(analysis.endpoints.len(), 1);
    assert_eq!(analysis.endpoints[0].path, "/users");
}

#[test]
fn test_walkdir_resolver_skips_hidden_and_cache_dirs() {
    let temp_dir = create_test_project(vec![
        (
            ".history/old_users.py",
            "users_router = APIRouter()\n",
        ),
        (
            "__pycache__/users.py",
            "users_router = APIRouter()\n",
        ),
        (
            "routers/users.py",
            "users_router = APIRouter()\n",
        ),
    ]);

    let resolved = WalkdirRouterResolver
        .resolve(temp_dir.path(), "users_router")
        .expect("router should resolve");
    assert_eq!(resolved, PathBuf::from("routers/users.py"));
}

#[test]
fn test_failed_router_does_not_block_others() {
    let temp_dir = create_test_project(vec![
        (
            "main.py",
            r#"
app = FastAPI()
app.include_router(good_router, prefix="/good")
app.include_router(missing_router, prefix="/missing")
"#,
        ),
        (
            "good.py",
            r#"
good_router = APIRouter()


@good_router.get("/thing")
def thing():
    return {}
"#,
        ),
    ]);

    let analysis = analyze_fastapi_app(temp_dir.path(), Path::new("main.py"))
        .expect("Failed to analyze project");

    // The unresolvable router is skipped, the resolvable one is merged
    let paths: Vec<&str> = analysis.endpoints.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["/good/thing"]);
}
