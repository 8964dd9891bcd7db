use coderecall::FileTree;

/// 20 packages of 9 modules holding 10 files each: 2000 lines.
fn large_listing() -> String {
    let mut listing = String::new();
    for package in 0..20 {
        listing.push_str(&format!("pkg{package}/\n"));
        for module in 0..9 {
            listing.push_str(&format!("  pkg{package}/mod{module}/\n"));
            for file in 0..10 {
                listing.push_str(&format!("    file{file}.py\n"));
            }
        }
    }
    listing
}

fn visible_dirs_without_children(tree: &FileTree) -> Vec<String> {
    let lines = tree.lines();
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.visible && line.is_dir)
        .filter(|(index, _)| {
            !lines
                .iter()
                .any(|child| child.visible && child.parent == Some(*index))
        })
        .map(|(_, line)| line.full_path().to_string())
        .collect()
}

#[test]
fn test_shrinking_large_tree_meets_budget() {
    let mut tree = FileTree::parse(&large_listing());
    assert_eq!(tree.complete_size(), 2000);
    assert_eq!(tree.current_size(), 2000);

    tree.collapse_innermost_directories_until(500);
    tree.collapse_empty_directories();

    assert!(tree.current_size() <= 500, "{} lines visible", tree.current_size());
    assert!(tree.current_size() > 0);
    assert!(visible_dirs_without_children(&tree).is_empty());
    assert_eq!(tree.render(false).lines().count(), tree.current_size());
}

#[test]
fn test_keep_only_then_reset_restores_tree() {
    let mut tree = FileTree::parse(&large_listing());
    let original = tree.render(false);

    tree.keep_only(&["pkg3/mod2/"]);
    assert_eq!(tree.current_size(), 12);
    assert!(tree.includes_file("pkg3/mod2/file7.py"));
    assert!(!tree.includes_file("pkg3/mod1/file7.py"));
    assert!(tree.includes_directory("pkg3/"));

    tree.reset();
    assert_eq!(tree.current_size(), tree.complete_size());
    assert_eq!(tree.render(false), original);
}

#[test]
fn test_expand_after_collapse_shows_children() {
    let mut tree = FileTree::parse(&large_listing());
    tree.collapse_directories(&["pkg0"]);
    assert_eq!(tree.current_size(), 1900);
    assert!(!tree.includes_directory("pkg0/"));

    tree.expand_directories(&["pkg0/mod4"]);
    assert!(tree.includes_directory("pkg0/"));
    assert!(tree.includes_directory("pkg0/mod4/"));
    assert!(tree.includes_file("pkg0/mod4/file0.py"));
    assert!(!tree.includes_directory("pkg0/mod3/"));
    assert_eq!(tree.current_size(), 1912);
}

#[test]
fn test_shrinking_hides_top_level_files_when_needed() {
    let mut tree =
        FileTree::parse("src/\n  a.py\n  b.py\nc.rs\nd.rs\ne.rs\nf.rs\ng.rs\nh.rs\n");
    assert_eq!(tree.current_size(), 9);

    tree.collapse_innermost_directories_until(3);
    assert!(tree.current_size() <= 3, "{} lines visible", tree.current_size());
}
