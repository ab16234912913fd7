//! Interactive menu
//!
//! Line-oriented loop over any reader/writer pair. Failed actions are reported
//! and leave the current tree as it was.

use std::io::{BufRead, Write};
use std::path::Path;

use tracing::debug;

use crate::application::services::TreeService;
use crate::application::ApplicationResult;
use crate::cli::CliResult;
use crate::domain::{BinaryTree, SearchOutcome, SearchReport};
use crate::infrastructure::InfraError;

const MENU: &str = "\
Main menu:
1. Load tree from file
2. Generate random tree
3. Create tree manually
4. Show current tree
5. Find subtree with given root
6. Find first valid subtree
7. Save current tree
8. Exit";

pub struct Menu<'a, R, W> {
    service: &'a TreeService,
    input: R,
    out: W,
    current: Option<BinaryTree>,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(service: &'a TreeService, input: R, out: W) -> Self {
        Self {
            service,
            input,
            out,
            current: None,
        }
    }

    /// Tree the menu is currently working on.
    pub fn current(&self) -> Option<&BinaryTree> {
        self.current.as_ref()
    }

    /// Run until "8" or end of input.
    pub fn run(&mut self) -> CliResult<()> {
        let max = self.service.settings().max_value;
        self.say(&format!("Binary tree tool (node values 1-{})", max))?;
        loop {
            self.say(&format!("\n{}", MENU))?;
            let Some(choice) = self.ask("Choose an action: ")? else {
                break;
            };
            debug!(choice = %choice, "menu choice");
            match choice.as_str() {
                "1" => self.load()?,
                "2" => self.generate()?,
                "3" => self.create_manually()?,
                "4" => self.show()?,
                "5" => self.find_with_root()?,
                "6" => self.find_first_valid()?,
                "7" => self.save()?,
                "8" => {
                    self.say("Bye.")?;
                    break;
                }
                _ => self.say("Invalid choice, pick 1 to 8.")?,
            }
        }
        Ok(())
    }

    fn say(&mut self, msg: &str) -> CliResult<()> {
        writeln!(self.out, "{}", msg).map_err(|e| InfraError::io("write menu output", e))?;
        Ok(())
    }

    /// Prompt and read one trimmed line; `None` at end of input.
    fn ask(&mut self, prompt: &str) -> CliResult<Option<String>> {
        write!(self.out, "{}", prompt)
            .and_then(|_| self.out.flush())
            .map_err(|e| InfraError::io("write prompt", e))?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| InfraError::io("read menu input", e))?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Print the error of a failed action instead of aborting the loop.
    fn report<T>(&mut self, result: ApplicationResult<T>) -> CliResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                self.say(&format!("Error: {}", e))?;
                Ok(None)
            }
        }
    }

    fn require_tree(&mut self) -> CliResult<Option<BinaryTree>> {
        match &self.current {
            Some(tree) => Ok(Some(tree.clone())),
            None => {
                self.say("No tree loaded!")?;
                Ok(None)
            }
        }
    }

    fn load(&mut self) -> CliResult<()> {
        let Some(file) = self.ask("File name: ")? else {
            return Ok(());
        };
        let result = self.service.load(Path::new(&file));
        if let Some(tree) = self.report(result)? {
            self.say(&format!("Tree loaded from {} ({} nodes)", file, tree.size()))?;
            self.current = Some(tree);
        }
        Ok(())
    }

    fn generate(&mut self) -> CliResult<()> {
        let Some(count) = self.ask("Number of nodes: ")? else {
            return Ok(());
        };
        let Some(probability) = self.ask("Probability of None nodes (0-1): ")? else {
            return Ok(());
        };
        let (Ok(count), Ok(probability)) = (count.parse::<usize>(), probability.parse::<f64>())
        else {
            return self.say("Error: enter a whole number of nodes and a probability");
        };

        let result = self.service.generate(count, Some(probability), None);
        let Some(tree) = self.report(result)? else {
            return Ok(());
        };
        self.say(&format!("Generated tree with {} nodes", tree.size()))?;
        self.current = Some(tree);

        if let Some(answer) = self.ask("Save tree to file? (y/n): ")? {
            if answer.eq_ignore_ascii_case("y") {
                self.save()?;
            }
        }
        Ok(())
    }

    fn create_manually(&mut self) -> CliResult<()> {
        self.say("Enter node values separated by commas, None for missing nodes.")?;
        self.say("Example: 1, 2, None, 3, 4")?;
        let Some(values) = self.ask("Values: ")? else {
            return Ok(());
        };
        let result = self.service.build_from_list(&values);
        if let Some(tree) = self.report(result)? {
            self.say(&format!("Tree created. Node count: {}", tree.size()))?;
            self.current = Some(tree);
        }
        Ok(())
    }

    fn show(&mut self) -> CliResult<()> {
        let Some(tree) = self.require_tree()? else {
            return Ok(());
        };
        let result = self.service.render(&tree);
        if let Some(rendered) = self.report(result)? {
            self.say(rendered.trim_end())?;
        }
        Ok(())
    }

    fn find_with_root(&mut self) -> CliResult<()> {
        let Some(tree) = self.require_tree()? else {
            return Ok(());
        };
        let max = self.service.settings().max_value;
        let Some(root) = self.ask(&format!("Root value (1-{}): ", max))? else {
            return Ok(());
        };
        let Ok(root) = root.parse::<i64>() else {
            return self.say("Error: root value must be an integer");
        };
        let in_range = self
            .service
            .settings()
            .bound()
            .and_then(|bound| Ok(bound.check(root)?));
        if self.report(in_range)?.is_none() {
            return Ok(());
        }
        let Some(blocked) = self.ask("Blocked values separated by spaces: ")? else {
            return Ok(());
        };
        let result = self
            .service
            .parse_blocked(&blocked)
            .and_then(|blocked| self.service.find_with_root(&tree, root, &blocked));
        if let Some(report) = self.report(result)? {
            self.describe(&report)?;
        }
        Ok(())
    }

    fn find_first_valid(&mut self) -> CliResult<()> {
        let Some(tree) = self.require_tree()? else {
            return Ok(());
        };
        let Some(blocked) = self.ask("Blocked values separated by spaces: ")? else {
            return Ok(());
        };
        let result = self.service.parse_blocked(&blocked);
        if let Some(blocked) = self.report(result)? {
            let report = self.service.find_first_valid(&tree, &blocked, None);
            self.describe(&report)?;
        }
        Ok(())
    }

    fn describe(&mut self, report: &SearchReport) -> CliResult<()> {
        match &report.outcome {
            SearchOutcome::Found(subtree) => {
                self.say(&format!(
                    "Search took {:.3} ms: found subtree rooted at {} with {} nodes",
                    report.elapsed_ms(),
                    subtree.root_value().map(|v| v.to_string()).unwrap_or_default(),
                    subtree.size()
                ))?;
                let result = self.service.render(subtree);
                if let Some(rendered) = self.report(result)? {
                    self.say(rendered.trim_end())?;
                }
            }
            SearchOutcome::Missed(miss) => {
                self.say(&format!("Search took {:.3} ms: {}", report.elapsed_ms(), miss))?;
            }
        }
        Ok(())
    }

    fn save(&mut self) -> CliResult<()> {
        let Some(tree) = self.require_tree()? else {
            return Ok(());
        };
        let Some(file) = self.ask("File name: ")? else {
            return Ok(());
        };
        let result = self.service.save(&tree, Path::new(&file));
        if self.report(result)?.is_some() {
            self.say(&format!("Tree saved to {}", file))?;
        }
        Ok(())
    }
}
