//! Whole-text matching of macro invocations.
//!
//! A [`Pattern`] describes the shape of one recognized form: a command or an
//! environment, the names it answers to, whether a star is allowed, how an
//! optional `[...]` argument is treated, and how many `{...}` arguments
//! follow. Matching always covers the entire raw text of a node; trailing
//! material makes the match fail.

use crate::parser::{bracketed, braced, command_name, environment, star};
use nom::{character::complete::multispace0, sequence::preceded, IResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    Command,
    Environment,
}

/// Treatment of the optional `[...]` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Optional {
    Forbidden,
    Allowed,
    Required,
}

#[derive(Debug, Clone, Copy)]
pub struct Pattern {
    form: Form,
    names: &'static [&'static str],
    starred: bool,
    optional: Optional,
    args: usize,
}

/// A successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// Command or environment name without the star
    pub name: &'a str,
    pub starred: bool,
    pub optional: Option<&'a str>,
    pub args: Vec<&'a str>,
    /// Environment body after its arguments; empty for commands
    pub body: &'a str,
    /// The whole matched text
    pub source: &'a str,
}

impl<'a> Invocation<'a> {
    /// The `i`-th braced argument, trimmed.
    pub fn arg(&self, i: usize) -> &'a str {
        self.args.get(i).map_or("", |a| a.trim())
    }
}

impl Pattern {
    pub const fn command(names: &'static [&'static str]) -> Self {
        Self {
            form: Form::Command,
            names,
            starred: false,
            optional: Optional::Forbidden,
            args: 0,
        }
    }

    pub const fn environment(names: &'static [&'static str]) -> Self {
        Self {
            form: Form::Environment,
            names,
            starred: false,
            optional: Optional::Forbidden,
            args: 0,
        }
    }

    pub const fn starred(mut self) -> Self {
        self.starred = true;
        self
    }

    pub const fn optional(mut self, optional: Optional) -> Self {
        self.optional = optional;
        self
    }

    pub const fn args(mut self, args: usize) -> Self {
        self.args = args;
        self
    }

    /// Match the entire text, ignoring surrounding whitespace.
    pub fn match_text<'a>(&self, text: &'a str) -> Option<Invocation<'a>> {
        let source = text.trim();
        let (rest, invocation) = match self.form {
            Form::Command => self.command_invocation(source).ok()?,
            Form::Environment => self.environment_invocation(source).ok()?,
        };
        rest.trim().is_empty().then_some(invocation)
    }

    fn accepts(&self, name: &str, starred: bool) -> bool {
        self.names.contains(&name) && (self.starred || !starred)
    }

    fn command_invocation<'a>(&self, source: &'a str) -> IResult<&'a str, Invocation<'a>> {
        let (input, name) = command_name(source)?;
        let (input, starred) = star(input)?;
        if !self.accepts(name, starred) {
            return reject(source);
        }
        let (input, (optional, args)) = self.arguments(input)?;
        Ok((
            input,
            Invocation {
                name,
                starred,
                optional,
                args,
                body: "",
                source,
            },
        ))
    }

    fn environment_invocation<'a>(&self, source: &'a str) -> IResult<&'a str, Invocation<'a>> {
        let (rest, env) = environment(source)?;
        let (name, starred) = match env.name.strip_suffix('*') {
            Some(name) => (name, true),
            None => (env.name, false),
        };
        if !self.accepts(name, starred) {
            return reject(source);
        }
        let (body, (optional, args)) = self.arguments(env.body)?;
        Ok((
            rest,
            Invocation {
                name,
                starred,
                optional,
                args,
                body,
                source,
            },
        ))
    }

    #[allow(clippy::type_complexity)]
    fn arguments<'a>(&self, input: &'a str) -> IResult<&'a str, (Option<&'a str>, Vec<&'a str>)> {
        let (mut input, optional) = match self.optional {
            Optional::Forbidden => (input, None),
            Optional::Allowed => match preceded(multispace0, bracketed)(input) {
                Ok((rest, opt)) => (rest, Some(opt)),
                // An opened but unclosed `[` is not an absent argument
                Err(_) if input.trim_start().starts_with('[') => return reject(input),
                Err(_) => (input, None),
            },
            Optional::Required => {
                let (rest, opt) = preceded(multispace0, bracketed)(input)?;
                (rest, Some(opt))
            }
        };

        let mut args = Vec::with_capacity(self.args);
        for _ in 0..self.args {
            let (rest, arg) = preceded(multispace0, braced)(input)?;
            args.push(arg);
            input = rest;
        }
        Ok((input, (optional, args)))
    }
}

fn reject<T>(input: &str) -> IResult<&str, T> {
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Tag,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_command_with_optional() {
        let cite = Pattern::command(&["cite"]).optional(Optional::Allowed).args(1);
        let inv = cite.match_text("  \\cite[p. 3]{Ale14, YS23} ").unwrap();
        assert_eq!(inv.name, "cite");
        assert_eq!(inv.optional, Some("p. 3"));
        assert_eq!(inv.args, vec!["Ale14, YS23"]);

        let bare = cite.match_text("\\cite{Ale14}").unwrap();
        assert_eq!(bare.optional, None);
    }

    #[test]
    fn test_whole_text_only() {
        let label = Pattern::command(&["label"]).args(1);
        assert!(label.match_text("\\label{a}").is_some());
        assert!(label.match_text("\\label{a} trailing").is_none());
        assert!(label.match_text("\\label").is_none());
        assert!(label.match_text("\\label{unbalanced").is_none());
        assert!(label.match_text("\\labels{a}").is_none());
    }

    #[test]
    fn test_required_optional_and_star() {
        let family = Pattern::command(&["family"]).optional(Optional::Required).args(1);
        assert!(family.match_text("\\family{X}").is_none());
        assert_eq!(family.match_text("\\family[schurS]{Schur}").unwrap().optional, Some("schurS"));
        assert!(family.match_text("\\family*[a]{X}").is_none());
    }

    #[test]
    fn test_environment() {
        let theorem = Pattern::environment(&["theorem", "lemma"])
            .starred()
            .optional(Optional::Allowed);
        let inv = theorem
            .match_text("\\begin{lemma*}[Pieri]\nBody \\cite{x}.\n\\end{lemma*}")
            .unwrap();
        assert_eq!(inv.name, "lemma");
        assert!(inv.starred);
        assert_eq!(inv.optional, Some("Pieri"));
        assert_eq!(inv.body.trim(), "Body \\cite{x}.");

        let polydata = Pattern::environment(&["polydata"]).args(1);
        let inv = polydata
            .match_text("\\begin{polydata}{schurS}\nName & Schur \\\\\n\\end{polydata}")
            .unwrap();
        assert_eq!(inv.arg(0), "schurS");
        assert_eq!(inv.body.trim(), "Name & Schur \\\\");
        assert!(polydata.match_text("\\begin{polydata}\nName\n\\end{polydata}").is_none());
    }

    #[test]
    fn test_unclosed_optional_fails() {
        let theorem = Pattern::environment(&["theorem"]).optional(Optional::Allowed);
        assert!(theorem
            .match_text("\\begin{theorem}[Schur\nBody.\n\\end{theorem}")
            .is_none());

        let image = Pattern::command(&["includeimage"]).optional(Optional::Allowed).args(1);
        assert!(image.match_text("\\includeimage[0.5{lie.svg}").is_none());
        assert!(image.match_text("\\includeimage{lie.svg}").is_some());
    }
}
