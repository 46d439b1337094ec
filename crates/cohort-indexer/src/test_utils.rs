//! Test utilities for cohort-indexer

use std::fs;

use tempfile::TempDir;

/// Create a temporary repository from `(relative path, content)` pairs
pub fn create_repo_with_structure(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for (path, content) in structure {
        let full_path = root.join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }

        fs::write(&full_path, content).unwrap();
    }

    temp_dir
}

/// A small mixed-language web project with one import cycle
pub fn create_shop_repo() -> TempDir {
    create_repo_with_structure(&[
        (
            "src/main.ts",
            "import { renderCart } from './cart/view';\nimport { api } from '@/api/client';\n",
        ),
        (
            "src/cart/view.ts",
            "import { Cart } from './model';\nexport function renderCart() {}\n",
        ),
        (
            "src/cart/model.ts",
            "import { renderCart } from './view';\nimport lodash from 'lodash';\nexport class Cart {}\n",
        ),
        ("src/api/client.ts", "export const api = {};\n"),
        ("src/api/index.ts", "export * from './client';\n"),
        ("scripts/build.py", "from .helpers import run\n"),
        ("scripts/helpers.py", "def run():\n    pass\n"),
    ])
}
