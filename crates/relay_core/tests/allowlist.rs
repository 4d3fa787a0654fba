use pretty_assertions::assert_eq;
use relay_core::{validate_repo_path, AllowList, RepoPathError, DEFAULT_ALLOWED_HOSTS};

#[test]
fn default_hosts_are_allowed() {
    let list = AllowList::default();
    for host in DEFAULT_ALLOWED_HOSTS {
        let url = format!("https://{host}/some/file.bin");
        assert!(list.is_allowed(&url), "expected {url} to be allowed");
    }
}

#[test]
fn subdomains_of_allowed_hosts_are_allowed() {
    let list = AllowList::default();
    assert!(list.is_allowed("https://cdn-lfs-us-1.huggingface.co/repos/ab/cd"));
    assert!(list.is_allowed("https://gist.github.com/someone/abc"));
}

#[test]
fn lookalike_hosts_are_rejected() {
    let list = AllowList::default();
    // Suffix match must only trigger on a dot boundary.
    assert!(!list.is_allowed("https://evilgithub.com/x"));
    assert!(!list.is_allowed("https://huggingface.co.attacker.example/x"));
}

#[test]
fn unknown_hosts_and_garbage_are_rejected() {
    let list = AllowList::default();
    assert!(!list.is_allowed("https://example.com/model.bin"));
    assert!(!list.is_allowed("not a url at all"));
    assert!(!list.is_allowed(""));
}

#[test]
fn non_http_schemes_are_rejected() {
    let list = AllowList::default();
    assert!(!list.is_allowed("ftp://huggingface.co/file"));
    assert!(!list.is_allowed("file:///etc/passwd"));
}

#[test]
fn extra_hosts_extend_the_default_set() {
    let list = AllowList::with_extra_hosts(vec!["mirror.internal".to_string()]);
    assert!(list.is_allowed("http://mirror.internal/weights.bin"));
    assert!(list.is_allowed("https://huggingface.co/gpt2"));
    assert!(!list.is_allowed("http://other.internal/weights.bin"));
}

#[test]
fn host_matching_is_case_insensitive() {
    let list = AllowList::default();
    assert!(list.is_allowed("https://HuggingFace.CO/gpt2/resolve/main/config.json"));
}

#[test]
fn repo_paths_reject_traversal_and_absolute() {
    assert_eq!(validate_repo_path("config.json"), Ok(()));
    assert_eq!(validate_repo_path("onnx/model.onnx"), Ok(()));
    assert_eq!(validate_repo_path(""), Err(RepoPathError::Empty));
    assert_eq!(validate_repo_path("/etc/passwd"), Err(RepoPathError::Absolute));
    assert_eq!(
        validate_repo_path("..\\secrets"),
        Err(RepoPathError::Traversal)
    );
    assert_eq!(
        validate_repo_path("a/../../b"),
        Err(RepoPathError::Traversal)
    );
}
