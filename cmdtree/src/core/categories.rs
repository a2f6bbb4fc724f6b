//! Category index used to group commands in help output.

use crate::command::Command;
use crate::core::names::lexicographic_cmp;

/// Commands sharing one category label.
#[derive(Debug, Clone, Default)]
pub struct CommandCategory {
    pub name: String,
    pub commands: Vec<Command>,
}

impl CommandCategory {
    pub fn visible_commands(&self) -> Vec<&Command> {
        self.commands.iter().filter(|c| !c.hidden).collect()
    }
}

/// Categories in display order.
#[derive(Debug, Clone, Default)]
pub struct CommandCategories(Vec<CommandCategory>);

impl CommandCategories {
    /// Index `commands` by category and sort the categories by name.
    pub fn from_commands(commands: &[Command]) -> Self {
        let mut categories = Self::default();
        for command in commands {
            categories.add_command(&command.category, command.clone());
        }
        categories.sort();
        categories
    }

    pub fn add_command(&mut self, category: &str, command: Command) {
        match self.0.iter_mut().find(|c| c.name == category) {
            Some(existing) => existing.commands.push(command),
            None => self.0.push(CommandCategory {
                name: category.to_string(),
                commands: vec![command],
            }),
        }
    }

    pub fn sort(&mut self) {
        self.0.sort_by(|a, b| lexicographic_cmp(&a.name, &b.name));
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandCategory> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_and_sorts_by_category() {
        let commands = vec![
            Command::new("push").category("remote"),
            Command::new("add"),
            Command::new("fetch").category("Remote"),
            Command::new("pull").category("remote"),
            Command::new("secret").category("admin").hidden(true),
        ];
        let categories = CommandCategories::from_commands(&commands);
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["", "admin", "Remote", "remote"]);

        let remote: Vec<&str> = categories
            .iter()
            .find(|c| c.name == "remote")
            .map(|c| c.commands.iter().map(|cmd| cmd.name.as_str()).collect())
            .unwrap_or_default();
        assert_eq!(remote, vec!["push", "pull"]);

        let admin = categories.iter().find(|c| c.name == "admin").expect("admin");
        assert!(admin.visible_commands().is_empty());
    }
}
