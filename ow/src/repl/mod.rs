//! Interactive wizard session
//!
//! Bare-word commands over a live editing session. Every edit lands in
//! local state immediately and is pushed to the backend on the session's
//! debounce timers; `quit` flushes whatever is still pending.

use chrono::Utc;
use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use courseapi::model::{BloomLevel, GapClassification, SubTaskNovelty, TriageColumn};
use courseapi::payloads::{ObjectivePatch, SubTaskPatch, TriageItemPatch};

use crate::compose::{StepKey, compose_objective_text, derive_step_status};
use crate::session::{SessionHandle, is_temp_id};
use crate::trace;

/// Interactive wizard REPL over one course session.
pub struct WizardRepl {
    session: SessionHandle,
    default_audience: String,
    current_step: StepKey,
}

impl WizardRepl {
    pub fn new(session: SessionHandle, default_audience: impl Into<String>) -> Self {
        Self {
            session,
            default_audience: default_audience.into(),
            current_step: StepKey::Context,
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome().await?;

        // Create readline editor for proper line editing
        let mut rl = DefaultEditor::new()
            .map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", "wizard>".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    match self.handle_command(input).await {
                        Ok(LoopResult::Continue) => continue,
                        Ok(LoopResult::Quit) => break,
                        Err(e) => {
                            println!("{} {}", "Error:".red(), e);
                            continue;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C - just show new prompt
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D - exit
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("{}", "Saving pending changes...".dimmed());
        self.session.shutdown().await?;
        println!("Goodbye!");
        Ok(())
    }

    async fn handle_command(&mut self, input: &str) -> Result<LoopResult> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");

        match cmd {
            "help" | "h" | "?" => {
                self.print_help();
                Ok(LoopResult::Continue)
            }
            "quit" | "q" | "exit" => Ok(LoopResult::Quit),
            "show" => self.show().await,
            "status" => self.status().await,
            "next" => self.step(true).await,
            "back" => self.step(false).await,
            "report" => self.report().await,
            "compose" => self.compose_all().await,
            "export" => self.export().await,
            "gap" => self.gap(&parts).await,
            "item" => self.item(&parts, input).await,
            "sub" => self.sub(&parts, input).await,
            "obj" => self.obj(&parts, input).await,
            "verbs" => {
                self.verbs(&parts);
                Ok(LoopResult::Continue)
            }
            "seed" => self.seed().await,
            "save" => self.save().await,
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "help".yellow());
                Ok(LoopResult::Continue)
            }
        }
    }

    /// Print welcome message
    async fn print_welcome(&self) -> Result<()> {
        let state = self.session.snapshot().await?;
        let title = if state.title.is_empty() {
            state.course_id.clone()
        } else {
            state.title.clone()
        };
        println!();
        println!("{}", "Objective Wizard".bright_cyan().bold());
        println!("Course: {}", title);
        if !state.na_summary.business_goal.is_empty() {
            println!("Goal: {}", state.na_summary.business_goal);
        }
        if !state.na_summary.audience.is_empty() {
            println!("Audience: {}", state.na_summary.audience);
        }
        println!(
            "Type {} for help, {} to quit",
            "help".yellow(),
            "quit".yellow()
        );
        println!();
        Ok(())
    }

    /// Print help message
    fn print_help(&self) {
        // Pad before coloring; escape codes confuse width specifiers.
        let pad = |s: &str| format!("{:<40}", s).yellow();
        println!();
        println!("{}", "Course:".bright_cyan());
        println!("  {} Show the whole course", pad("show"));
        println!("  {} Per-step progress", pad("status"));
        println!("  {} Move to the next wizard step", pad("next"));
        println!("  {} Move to the previous wizard step", pad("back"));
        println!("  {} Traceability report", pad("report"));
        println!("  {} Print every objective sentence", pad("compose"));
        println!("  {} Markdown export", pad("export"));
        println!("  {} Classify the gap", pad("gap <knowledge|skill|both|none>"));
        println!();
        println!("{}", "Triage items:".bright_cyan());
        println!("  {} Add a custom item", pad("item add <text>"));
        println!("  {} Move between columns", pad("item move <id> <must|should|nice>"));
        println!("  {} Rewrite the text", pad("item text <id> <text>"));
        println!("  {} Delete a custom item", pad("item rm <id>"));
        println!();
        println!("{}", "Sub-tasks:".bright_cyan());
        println!("  {} Break an item down", pad("sub add <item> <text>"));
        println!("  {} Mark novelty", pad("sub mark <id> <new|can|unsure>"));
        println!("  {} Rewrite the text", pad("sub text <id> <text>"));
        println!("  {} Delete a sub-task", pad("sub rm <id>"));
        println!();
        println!("{}", "Objectives:".bright_cyan());
        println!("  {} New objective, optionally linked", pad("obj add [item]"));
        println!("  {} Show one objective in full", pad("obj show <id>"));
        println!("  {} Set an ABCD or note field", pad("obj set <id> <field> <text>"));
        println!("  {} Classify cognitive level", pad("obj bloom <id> <level|none>"));
        println!("  {} Classify knowledge dimension", pad("obj know <id> <dim|none>"));
        println!("  {} Set priority", pad("obj priority <id> <must|should|nice|none>"));
        println!("  {} Link to a triage item", pad("obj link <id> <item|none>"));
        println!("  {} Toggle assessment flag", pad("obj assess <id> <on|off>"));
        println!("  {} Delete an objective", pad("obj rm <id>"));
        println!();
        println!("{}", "Other:".bright_cyan());
        println!("  {} Bloom verb suggestions", pad("verbs [level]"));
        println!("  {} Blank objectives for uncovered items", pad("seed"));
        println!("  {} Push pending writes now", pad("save"));
        println!("  {} Flush and exit", pad("quit"));
        println!();
        println!(
            "{}",
            "Ids can be abbreviated to any unique prefix. Fields for `obj set`:".dimmed()
        );
        println!(
            "{}",
            "  audience verb behavior condition criteria freeform wiifm rationale".dimmed()
        );
        println!();
    }

    async fn show(&self) -> Result<LoopResult> {
        let state = self.session.snapshot().await?;
        let audience = state.default_audience(&self.default_audience);

        println!();
        println!("Gap: {}", state.gap.label());
        for column in [TriageColumn::Must, TriageColumn::Should, TriageColumn::Nice] {
            let mut items: Vec<_> = state
                .triage_items
                .iter()
                .filter(|i| i.column == column)
                .collect();
            items.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.cmp(&b.id)));

            println!();
            println!("{}", column.label().bright_cyan());
            if items.is_empty() {
                println!("  {}", "(none)".dimmed());
            }
            for item in items {
                println!("  {} {}{}", item.id.yellow(), item.text, saving_marker(&item.id));
                for sub in state.sub_tasks_of(&item.id) {
                    println!(
                        "    - {} {} [{}]{}",
                        sub.id.yellow(),
                        sub.text,
                        sub.is_new,
                        saving_marker(&sub.id)
                    );
                }
            }
        }

        println!();
        println!("{}", "Objectives".bright_cyan());
        if state.objectives.is_empty() {
            println!("  {}", "(none)".dimmed());
        }
        let mut objectives: Vec<_> = state.objectives.iter().collect();
        objectives.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.cmp(&b.id)));
        for obj in objectives {
            println!(
                "  {} {}{}",
                obj.id.yellow(),
                compose_objective_text(obj, &audience),
                saving_marker(&obj.id)
            );
        }
        println!();
        Ok(LoopResult::Continue)
    }

    async fn status(&self) -> Result<LoopResult> {
        let state = self.session.snapshot().await?;
        let steps = derive_step_status(
            &state.gap,
            &state.triage_items,
            &state.sub_tasks,
            &state.objectives,
        );
        println!();
        for key in StepKey::ORDERED {
            let marker = if key == self.current_step { ">" } else { " " };
            if let Some(status) = steps.get(&key) {
                println!("{} {} {}", marker, status.symbol(), key.label());
            }
        }
        println!();
        Ok(LoopResult::Continue)
    }

    /// Move the step cursor. Navigation is never gated on step status.
    async fn step(&mut self, forward: bool) -> Result<LoopResult> {
        let moved = if forward {
            self.current_step.next()
        } else {
            self.current_step.prev()
        };
        let Some(step) = moved else {
            let edge = if forward { "last" } else { "first" };
            println!("{}", format!("Already at the {} step.", edge).dimmed());
            return Ok(LoopResult::Continue);
        };
        self.current_step = step;

        let state = self.session.snapshot().await?;
        let steps = derive_step_status(
            &state.gap,
            &state.triage_items,
            &state.sub_tasks,
            &state.objectives,
        );
        let symbol = steps.get(&step).map_or("[ ]", |s| s.symbol());
        println!("{} {}", symbol, step.label().bright_cyan());
        Ok(LoopResult::Continue)
    }

    async fn report(&self) -> Result<LoopResult> {
        let state = self.session.snapshot().await?;
        let report = trace::build_report(&state.triage_items, &state.objectives);
        println!();
        print!("{}", report.render_text());
        println!();
        Ok(LoopResult::Continue)
    }

    async fn compose_all(&self) -> Result<LoopResult> {
        let state = self.session.snapshot().await?;
        let audience = state.default_audience(&self.default_audience);
        println!();
        if state.objectives.is_empty() {
            println!("{}", "No objectives yet.".dimmed());
        }
        for (i, obj) in state.objectives.iter().enumerate() {
            println!("{:>3}. {}", i + 1, compose_objective_text(obj, &audience));
        }
        println!();
        Ok(LoopResult::Continue)
    }

    async fn export(&self) -> Result<LoopResult> {
        let state = self.session.snapshot().await?;
        let audience = state.default_audience(&self.default_audience);
        let groups = trace::build_export(&state.triage_items, &state.objectives, &audience);
        println!();
        print!("{}", trace::render_markdown(&groups, Utc::now()));
        println!();
        Ok(LoopResult::Continue)
    }

    async fn gap(&self, parts: &[&str]) -> Result<LoopResult> {
        let setting = parts.get(1).copied().unwrap_or("");
        let (knowledge, skill) = match setting {
            "" => {
                let state = self.session.snapshot().await?;
                println!("Gap: {}", state.gap.label());
                return Ok(LoopResult::Continue);
            }
            "knowledge" | "k" => (true, false),
            "skill" | "s" => (false, true),
            "both" | "b" => (true, true),
            "none" | "n" => (false, false),
            other => {
                println!("{} Unknown gap setting: {}", "?".yellow(), other);
                println!("Use: gap <knowledge|skill|both|none>");
                return Ok(LoopResult::Continue);
            }
        };
        self.session.set_gap(knowledge, skill).await?;
        println!("Gap set to {}", GapClassification::new(knowledge, skill).label());
        Ok(LoopResult::Continue)
    }

    async fn item(&self, parts: &[&str], input: &str) -> Result<LoopResult> {
        match parts.get(1).copied().unwrap_or("") {
            "add" => {
                let text = rest_after(input, 2);
                if text.is_empty() {
                    println!("Use: item add <text>");
                    return Ok(LoopResult::Continue);
                }
                let id = self.session.add_triage_item(text).await?;
                println!("Added {}{}", id.yellow(), saving_marker(&id));
            }
            "move" => {
                let (Some(prefix), Some(raw)) = (parts.get(2), parts.get(3)) else {
                    println!("Use: item move <id> <must|should|nice>");
                    return Ok(LoopResult::Continue);
                };
                let column: TriageColumn = match raw.parse() {
                    Ok(column) => column,
                    Err(e) => {
                        println!("{} {}", "?".yellow(), e);
                        return Ok(LoopResult::Continue);
                    }
                };
                let id = self.resolve_item(prefix).await?;
                let patch = TriageItemPatch {
                    column: Some(column),
                    ..Default::default()
                };
                self.session.update_triage_item(&id, patch).await?;
                println!("{} moved to {}", id.yellow(), column.label());
            }
            "text" => {
                let Some(prefix) = parts.get(2) else {
                    println!("Use: item text <id> <text>");
                    return Ok(LoopResult::Continue);
                };
                let text = rest_after(input, 3);
                if text.is_empty() {
                    println!("Use: item text <id> <text>");
                    return Ok(LoopResult::Continue);
                }
                let id = self.resolve_item(prefix).await?;
                let patch = TriageItemPatch {
                    text: Some(text),
                    ..Default::default()
                };
                self.session.update_triage_item(&id, patch).await?;
                println!("{} updated", id.yellow());
            }
            "rm" => {
                let Some(prefix) = parts.get(2) else {
                    println!("Use: item rm <id>");
                    return Ok(LoopResult::Continue);
                };
                let id = self.resolve_item(prefix).await?;
                self.session.remove_triage_item(&id).await?;
                println!("{} removed", id.yellow());
            }
            _ => println!("Use: item <add|move|text|rm> ..."),
        }
        Ok(LoopResult::Continue)
    }

    async fn sub(&self, parts: &[&str], input: &str) -> Result<LoopResult> {
        match parts.get(1).copied().unwrap_or("") {
            "add" => {
                let Some(prefix) = parts.get(2) else {
                    println!("Use: sub add <item> <text>");
                    return Ok(LoopResult::Continue);
                };
                let text = rest_after(input, 3);
                if text.is_empty() {
                    println!("Use: sub add <item> <text>");
                    return Ok(LoopResult::Continue);
                }
                let parent = self.resolve_item(prefix).await?;
                let id = self.session.add_sub_task(&parent, text).await?;
                println!("Added {}{}", id.yellow(), saving_marker(&id));
            }
            "mark" => {
                let (Some(prefix), Some(raw)) = (parts.get(2), parts.get(3)) else {
                    println!("Use: sub mark <id> <new|can|unsure>");
                    return Ok(LoopResult::Continue);
                };
                let novelty: SubTaskNovelty = match raw.parse() {
                    Ok(novelty) => novelty,
                    Err(e) => {
                        println!("{} {}", "?".yellow(), e);
                        return Ok(LoopResult::Continue);
                    }
                };
                let id = self.resolve_sub(prefix).await?;
                self.session
                    .update_sub_task(&id, SubTaskPatch::novelty(novelty))
                    .await?;
                println!("{} marked {}", id.yellow(), novelty);
            }
            "text" => {
                let Some(prefix) = parts.get(2) else {
                    println!("Use: sub text <id> <text>");
                    return Ok(LoopResult::Continue);
                };
                let text = rest_after(input, 3);
                if text.is_empty() {
                    println!("Use: sub text <id> <text>");
                    return Ok(LoopResult::Continue);
                }
                let id = self.resolve_sub(prefix).await?;
                self.session
                    .update_sub_task(&id, SubTaskPatch::text(text))
                    .await?;
                println!("{} updated", id.yellow());
            }
            "rm" => {
                let Some(prefix) = parts.get(2) else {
                    println!("Use: sub rm <id>");
                    return Ok(LoopResult::Continue);
                };
                let id = self.resolve_sub(prefix).await?;
                self.session.remove_sub_task(&id).await?;
                println!("{} removed", id.yellow());
            }
            _ => println!("Use: sub <add|mark|text|rm> ..."),
        }
        Ok(LoopResult::Continue)
    }

    async fn obj(&self, parts: &[&str], input: &str) -> Result<LoopResult> {
        match parts.get(1).copied().unwrap_or("") {
            "add" => {
                let linked = match parts.get(2) {
                    Some(prefix) => Some(self.resolve_item(prefix).await?),
                    None => None,
                };
                let id = self.session.add_objective(linked).await?;
                println!("Added {}{}", id.yellow(), saving_marker(&id));
            }
            "show" => {
                let Some(prefix) = parts.get(2) else {
                    println!("Use: obj show <id>");
                    return Ok(LoopResult::Continue);
                };
                let id = self.resolve_obj(prefix).await?;
                self.show_objective(&id).await?;
            }
            "set" => {
                let (Some(prefix), Some(field)) = (parts.get(2), parts.get(3)) else {
                    println!("Use: obj set <id> <field> <text>");
                    return Ok(LoopResult::Continue);
                };
                let value = rest_after(input, 4);
                let patch = match *field {
                    "audience" => ObjectivePatch {
                        audience: Some(value),
                        ..Default::default()
                    },
                    "verb" => ObjectivePatch {
                        verb: Some(value),
                        ..Default::default()
                    },
                    "behavior" => ObjectivePatch {
                        behavior: Some(value),
                        ..Default::default()
                    },
                    "condition" => ObjectivePatch {
                        condition: Some(value),
                        ..Default::default()
                    },
                    "criteria" => ObjectivePatch {
                        criteria: Some(value),
                        ..Default::default()
                    },
                    "freeform" => ObjectivePatch {
                        freeform_text: Some(value),
                        ..Default::default()
                    },
                    "wiifm" => ObjectivePatch {
                        wiifm: Some(value),
                        ..Default::default()
                    },
                    "rationale" => ObjectivePatch {
                        rationale: Some(value),
                        ..Default::default()
                    },
                    other => {
                        println!("{} Unknown field: {}", "?".yellow(), other);
                        println!(
                            "Fields: audience verb behavior condition criteria freeform wiifm rationale"
                        );
                        return Ok(LoopResult::Continue);
                    }
                };
                let id = self.resolve_obj(prefix).await?;
                self.session.update_objective(&id, patch).await?;
                println!("{} updated", id.yellow());
            }
            "bloom" => {
                let (Some(prefix), Some(raw)) = (parts.get(2), parts.get(3)) else {
                    println!("Use: obj bloom <id> <level|none>");
                    return Ok(LoopResult::Continue);
                };
                let level = match *raw {
                    "none" => None,
                    raw => match raw.parse::<BloomLevel>() {
                        Ok(level) => Some(level),
                        Err(e) => {
                            println!("{} {}", "?".yellow(), e);
                            return Ok(LoopResult::Continue);
                        }
                    },
                };
                let id = self.resolve_obj(prefix).await?;
                let patch = ObjectivePatch {
                    bloom_level: Some(level),
                    ..Default::default()
                };
                self.session.update_objective(&id, patch).await?;
                match level {
                    Some(level) => {
                        println!("{} classified {}", id.yellow(), level);
                        println!("  {} {}", "verbs:".dimmed(), level.verbs().join(", ").dimmed());
                    }
                    None => println!("{} level cleared", id.yellow()),
                }
            }
            "know" => {
                let (Some(prefix), Some(raw)) = (parts.get(2), parts.get(3)) else {
                    println!("Use: obj know <id> <dim|none>");
                    return Ok(LoopResult::Continue);
                };
                let dimension = match *raw {
                    "none" => None,
                    raw => match raw.parse() {
                        Ok(dimension) => Some(dimension),
                        Err(e) => {
                            println!("{} {}", "?".yellow(), e);
                            return Ok(LoopResult::Continue);
                        }
                    },
                };
                let id = self.resolve_obj(prefix).await?;
                let patch = ObjectivePatch {
                    bloom_knowledge: Some(dimension),
                    ..Default::default()
                };
                self.session.update_objective(&id, patch).await?;
                println!("{} updated", id.yellow());
            }
            "priority" => {
                let (Some(prefix), Some(raw)) = (parts.get(2), parts.get(3)) else {
                    println!("Use: obj priority <id> <must|should|nice|none>");
                    return Ok(LoopResult::Continue);
                };
                let priority = match *raw {
                    "none" => None,
                    raw => match raw.parse() {
                        Ok(priority) => Some(priority),
                        Err(e) => {
                            println!("{} {}", "?".yellow(), e);
                            return Ok(LoopResult::Continue);
                        }
                    },
                };
                let id = self.resolve_obj(prefix).await?;
                let patch = ObjectivePatch {
                    priority: Some(priority),
                    ..Default::default()
                };
                self.session.update_objective(&id, patch).await?;
                println!("{} updated", id.yellow());
            }
            "link" => {
                let (Some(prefix), Some(raw)) = (parts.get(2), parts.get(3)) else {
                    println!("Use: obj link <id> <item|none>");
                    return Ok(LoopResult::Continue);
                };
                let link = match *raw {
                    "none" => None,
                    raw => Some(self.resolve_item(raw).await?),
                };
                let id = self.resolve_obj(prefix).await?;
                let patch = ObjectivePatch {
                    linked_task_id: Some(link.clone()),
                    ..Default::default()
                };
                self.session.update_objective(&id, patch).await?;
                match link {
                    Some(item_id) => println!("{} linked to {}", id.yellow(), item_id.yellow()),
                    None => println!("{} unlinked", id.yellow()),
                }
            }
            "assess" => {
                let (Some(prefix), Some(raw)) = (parts.get(2), parts.get(3)) else {
                    println!("Use: obj assess <id> <on|off>");
                    return Ok(LoopResult::Continue);
                };
                let requires = match *raw {
                    "on" | "yes" | "true" => true,
                    "off" | "no" | "false" => false,
                    other => {
                        println!("{} Use on or off, got: {}", "?".yellow(), other);
                        return Ok(LoopResult::Continue);
                    }
                };
                let id = self.resolve_obj(prefix).await?;
                let patch = ObjectivePatch {
                    requires_assessment: Some(requires),
                    ..Default::default()
                };
                self.session.update_objective(&id, patch).await?;
                println!("{} updated", id.yellow());
            }
            "rm" => {
                let Some(prefix) = parts.get(2) else {
                    println!("Use: obj rm <id>");
                    return Ok(LoopResult::Continue);
                };
                let id = self.resolve_obj(prefix).await?;
                self.session.remove_objective(&id).await?;
                println!("{} removed", id.yellow());
            }
            _ => println!("Use: obj <add|show|set|bloom|know|priority|link|assess|rm> ..."),
        }
        Ok(LoopResult::Continue)
    }

    async fn show_objective(&self, id: &str) -> Result<()> {
        let state = self.session.snapshot().await?;
        let audience = state.default_audience(&self.default_audience);
        let Some(obj) = state.objective(id) else {
            println!("{} No objective {}", "?".yellow(), id);
            return Ok(());
        };
        println!();
        println!("{} {}{}", obj.id.yellow().bold(), compose_objective_text(obj, &audience), saving_marker(&obj.id));
        println!("  audience:  {}", field_or_dash(&obj.audience));
        println!("  verb:      {}", field_or_dash(&obj.verb));
        println!("  behavior:  {}", field_or_dash(&obj.behavior));
        println!("  condition: {}", field_or_dash(&obj.condition));
        println!("  criteria:  {}", field_or_dash(&obj.criteria));
        println!("  freeform:  {}", field_or_dash(&obj.freeform_text));
        println!(
            "  bloom:     {} / {}",
            obj.bloom_level.map_or("-".to_string(), |l| l.to_string()),
            obj.bloom_knowledge.map_or("-".to_string(), |k| k.to_string()),
        );
        println!(
            "  priority:  {}",
            obj.priority.map_or("-".to_string(), |p| p.to_string())
        );
        let linked = match obj.linked_task_id.as_deref() {
            Some(item_id) => match state.triage_item(item_id) {
                Some(item) => format!("{} ({})", item_id, item.text),
                None => format!("{} (missing)", item_id),
            },
            None => "-".to_string(),
        };
        println!("  linked:    {}", linked);
        println!(
            "  assess:    {}",
            if obj.requires_assessment { "yes" } else { "no" }
        );
        if !obj.wiifm.is_empty() {
            println!("  wiifm:     {}", obj.wiifm);
        }
        if !obj.rationale.is_empty() {
            println!("  rationale: {}", obj.rationale);
        }
        if obj.lacks_needed_assessment() {
            println!(
                "  {}",
                "note: higher-order level without an assessment".yellow()
            );
        }
        println!();
        Ok(())
    }

    fn verbs(&self, parts: &[&str]) {
        println!();
        match parts.get(1) {
            Some(raw) => match raw.parse::<BloomLevel>() {
                Ok(level) => print_verbs(level),
                Err(e) => println!("{} {}", "?".yellow(), e),
            },
            None => {
                for level in BloomLevel::ALL {
                    print_verbs(level);
                }
            }
        }
        println!();
    }

    async fn seed(&self) -> Result<LoopResult> {
        let created = self.session.seed_uncovered().await?;
        if created.is_empty() {
            println!("Every active item already has an objective.");
        } else {
            println!(
                "Created {} blank objective(s){}",
                created.len(),
                " (saving)".dimmed()
            );
        }
        Ok(LoopResult::Continue)
    }

    async fn save(&self) -> Result<LoopResult> {
        self.session.flush().await?;
        println!("{}", "Saved.".dimmed());
        Ok(LoopResult::Continue)
    }

    async fn resolve_item(&self, prefix: &str) -> Result<String> {
        let state = self.session.snapshot().await?;
        resolve(
            state.triage_items.iter().map(|i| i.id.as_str()),
            prefix,
            "triage item",
        )
    }

    async fn resolve_sub(&self, prefix: &str) -> Result<String> {
        let state = self.session.snapshot().await?;
        resolve(
            state.sub_tasks.iter().map(|s| s.id.as_str()),
            prefix,
            "sub-task",
        )
    }

    async fn resolve_obj(&self, prefix: &str) -> Result<String> {
        let state = self.session.snapshot().await?;
        resolve(
            state.objectives.iter().map(|o| o.id.as_str()),
            prefix,
            "objective",
        )
    }
}

/// Result of handling a command
enum LoopResult {
    Continue,
    Quit,
}

fn print_verbs(level: BloomLevel) {
    let name = format!("{:<13}", level.to_string());
    println!("  {} {}", name.bright_cyan(), level.verbs().join(", "));
}

fn field_or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

fn saving_marker(id: &str) -> String {
    if is_temp_id(id) {
        format!(" {}", "(saving)".dimmed())
    } else {
        String::new()
    }
}

/// Everything after the first `words` whitespace-separated tokens.
fn rest_after(input: &str, words: usize) -> String {
    input
        .split_whitespace()
        .skip(words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve an id prefix against known ids. Exact matches win; otherwise
/// the prefix must be unique.
fn resolve<'a>(ids: impl Iterator<Item = &'a str>, prefix: &str, what: &str) -> Result<String> {
    let all: Vec<&str> = ids.collect();
    if let Some(exact) = all.iter().find(|id| **id == prefix) {
        return Ok((*exact).to_string());
    }
    let matches: Vec<&str> = all
        .into_iter()
        .filter(|id| id.starts_with(prefix))
        .collect();
    match matches.len() {
        1 => Ok(matches[0].to_string()),
        0 => Err(eyre::eyre!("No {} matches '{}'", what, prefix)),
        _ => Err(eyre::eyre!(
            "'{}' matches several {}s: {}",
            prefix,
            what,
            matches.join(", ")
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_after_skips_command_words() {
        assert_eq!(rest_after("item add Practice the handoff", 2), "Practice the handoff");
        assert_eq!(rest_after("item add", 2), "");
        assert_eq!(rest_after("obj set o1 criteria with 90% accuracy", 4), "with 90% accuracy");
    }

    #[test]
    fn test_resolve_prefers_exact_match() {
        let ids = ["t1", "t12", "t2"];
        let resolved = resolve(ids.iter().copied(), "t1", "item").unwrap();
        assert_eq!(resolved, "t1");
    }

    #[test]
    fn test_resolve_unique_prefix() {
        let ids = ["st-alpha", "st-beta"];
        assert_eq!(resolve(ids.iter().copied(), "st-a", "item").unwrap(), "st-alpha");
        assert!(resolve(ids.iter().copied(), "st-", "item").is_err());
        assert!(resolve(ids.iter().copied(), "zz", "item").is_err());
    }
}
