//! The generated build/publish pipeline definition and README.
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the pipeline definition file.
pub(crate) const CI_FILE: &str = ".gitlab-ci.yml";

/// Name of the generated README.
pub(crate) const README_FILE: &str = "README.md";

/// The PDF artifact a TeX entrypoint compiles to.
fn pdf_name(main_tex: &str) -> String {
    let stem = main_tex.strip_suffix(".tex").unwrap_or(main_tex);
    format!("{stem}.pdf")
}

/// Render the pipeline definition.
///
/// One build job compiling `main_tex` with latexmk, one pages job
/// publishing the PDF, restricted to the default branch.
pub fn ci_config(main_tex: &str) -> String {
    let pdf = pdf_name(main_tex);
    format!(
        r#"stages:
  - build
  - deploy

build-pdf:
  stage: build
  image: texlive/texlive:latest
  script:
    - latexmk -pdf -interaction=nonstopmode -halt-on-error {main_tex}
  artifacts:
    paths:
      - {pdf}

pages:
  stage: deploy
  script:
    - mkdir -p public
    - cp {pdf} public/
  artifacts:
    paths:
      - public
  rules:
    - if: $CI_COMMIT_BRANCH == $CI_DEFAULT_BRANCH
"#
    )
}

/// The URL the published PDF will appear under via GitLab Pages.
pub fn pages_url(namespace: &str, path: &str, main_tex: &str) -> String {
    format!("https://{namespace}.gitlab.io/{path}/{}", pdf_name(main_tex))
}

/// Render the README pointing at the published artifact.
pub fn readme(pages_url: &str) -> String {
    format!("[Latest manuscript]({pages_url})\n")
}

/// Write the pipeline definition and README into the working copy.
///
/// Returns the written paths relative to the worktree root, ready to
/// be staged.
///
/// # Errors
/// An io error when a file cannot be written.
pub fn install(
    dir: &Path,
    main_tex: &str,
    pages_url: &str,
) -> std::io::Result<Vec<PathBuf>> {
    fs::write(dir.join(CI_FILE), ci_config(main_tex))?;
    fs::write(dir.join(README_FILE), readme(pages_url))?;
    Ok(vec![PathBuf::from(CI_FILE), PathBuf::from(README_FILE)])
}
