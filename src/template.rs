//! Placeholder substitution for scaffolded sources and text resources

use crate::project::Project;

pub const PROJECT_NAME: &str = "$__PROJECT_NAME__$";
pub const PROJECT_VERSION: &str = "$__PROJECT_VERSION__$";
/// Short class name of the main class
pub const PROJECT_MAIN_CLASS: &str = "$__PROJECT_MAIN_CLASS__$";
pub const PROJECT_PACKAGE_NAME: &str = "$__PROJECT_PACKAGE_NAME__$";
pub const PROJECT_DESCRIPTION: &str = "$__PROJECT_DESCRIPTION__$";

/// Values substituted for the placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
    pairs: [(&'static str, String); 5],
}

impl TemplateContext {
    pub fn from_project(project: &Project) -> Self {
        Self {
            pairs: [
                (PROJECT_NAME, project.name.clone()),
                (PROJECT_VERSION, project.version.clone()),
                (PROJECT_MAIN_CLASS, project.main_class_name().to_string()),
                (PROJECT_PACKAGE_NAME, project.package_name().to_string()),
                (PROJECT_DESCRIPTION, project.description.clone()),
            ],
        }
    }

    pub fn render(&self, text: &str) -> String {
        self.pairs
            .iter()
            .fold(text.to_string(), |out, (placeholder, value)| {
                out.replace(placeholder, value)
            })
    }

    /// Render UTF-8 content; anything else is returned unchanged
    pub fn render_bytes(&self, bytes: Vec<u8>) -> Vec<u8> {
        match String::from_utf8(bytes) {
            Ok(text) => self.render(&text).into_bytes(),
            Err(e) => e.into_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Compatibility;

    fn context() -> TemplateContext {
        let mut project = Project::new(
            "MyPlugin",
            "2.1.0",
            "com.example.myplugin.MyPlugin",
            Compatibility::new("paper", "1.21.4"),
        );
        project.description = "Does things".into();
        TemplateContext::from_project(&project)
    }

    #[test]
    fn test_render_all_placeholders() {
        let text = "package $__PROJECT_PACKAGE_NAME__$;\n\
                    class $__PROJECT_MAIN_CLASS__$ {} // $__PROJECT_NAME__$ $__PROJECT_VERSION__$: $__PROJECT_DESCRIPTION__$";
        assert_eq!(
            context().render(text),
            "package com.example.myplugin;\nclass MyPlugin {} // MyPlugin 2.1.0: Does things"
        );
    }

    #[test]
    fn test_unknown_placeholders_untouched() {
        assert_eq!(context().render("$__OTHER__$ $x"), "$__OTHER__$ $x");
    }

    #[test]
    fn test_binary_passthrough() {
        let bytes = vec![0xff, 0xfe, b'$', 0x00];
        assert_eq!(context().render_bytes(bytes.clone()), bytes);
    }
}
