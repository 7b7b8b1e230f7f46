// * Server Config Export
// * Textual serialization of the active redirect rules into each server's native syntax

use crate::redirect::errors::RedirectError;
use crate::redirect::resolver::BACKREFERENCE;
use crate::redirect::rules::{RedirectRule, RedirectSource};
use regex::Captures;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    Nginx,
    Apache,
    Vercel,
    Netlify,
}

impl ServerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerType::Nginx => "nginx",
            ServerType::Apache => "apache",
            ServerType::Vercel => "vercel",
            ServerType::Netlify => "netlify",
        }
    }

    /// Conventional file name for the generated config
    pub fn file_name(&self) -> &'static str {
        match self {
            ServerType::Nginx => "redirects.conf",
            ServerType::Apache => ".htaccess",
            ServerType::Vercel => "vercel.json",
            ServerType::Netlify => "_redirects",
        }
    }
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerType {
    type Err = RedirectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nginx" => Ok(ServerType::Nginx),
            "apache" => Ok(ServerType::Apache),
            "vercel" => Ok(ServerType::Vercel),
            "netlify" => Ok(ServerType::Netlify),
            other => Err(RedirectError::UnknownServer(other.to_string())),
        }
    }
}

/// Renders the active rules for `server`, in evaluation order
pub fn generate(rules: &[RedirectRule], server: ServerType) -> Result<String, RedirectError> {
    let active: Vec<&RedirectRule> = rules.iter().filter(|r| r.is_active).collect();

    match server {
        ServerType::Nginx => render_lines(&active, "# Redirects generated by link-flow", nginx_rule),
        ServerType::Apache => render_lines(
            &active,
            "# Redirects generated by link-flow\nRewriteEngine On",
            apache_rule,
        ),
        ServerType::Vercel => vercel(&active),
        ServerType::Netlify => render_lines(&active, "# Redirects generated by link-flow", netlify_rule),
    }
}

fn render_lines(
    rules: &[&RedirectRule],
    header: &str,
    render: fn(&RedirectRule, &str) -> Result<String, RedirectError>,
) -> Result<String, RedirectError> {
    let mut out = String::from(header);
    out.push('\n');
    for rule in rules {
        out.push_str(&render(rule, literal_destination(rule)?)?);
        out.push('\n');
    }
    Ok(out)
}

fn literal_destination(rule: &RedirectRule) -> Result<&str, RedirectError> {
    rule.destination
        .as_literal()
        .ok_or_else(|| RedirectError::ComputedDestination(rule.id.clone()))
}

fn nginx_rule(rule: &RedirectRule, destination: &str) -> Result<String, RedirectError> {
    let code = rule.status_code.code();
    let args = if rule.preserve_query { "$is_args$args" } else { "" };

    let location = match &rule.source {
        RedirectSource::Exact(path) => format!("location = {}", path),
        RedirectSource::Pattern(regex) => format!("location ~ \"{}\"", regex.as_str()),
    };

    let mut block = format!("# {}\n", rule.id);
    if rule.conditions.is_some() {
        block.push_str("# request conditions are enforced by the application, not this block\n");
    }
    block.push_str(&format!("{} {{ return {} {}{}; }}", location, code, destination, args));
    Ok(block)
}

fn apache_rule(rule: &RedirectRule, destination: &str) -> Result<String, RedirectError> {
    let code = rule.status_code.code();
    let pattern = match &rule.source {
        RedirectSource::Exact(path) => format!("^{}$", regex::escape(path.trim_start_matches('/'))),
        RedirectSource::Pattern(regex) => {
            // * .htaccess RewriteRule patterns see the path without its leading slash
            let expr = regex.as_str();
            match expr.strip_prefix("^/") {
                Some(rest) => format!("^{}", rest),
                None => expr.to_string(),
            }
        }
    };

    let mut flags = vec![format!("R={}", code), "L".to_string()];
    if !rule.preserve_query {
        flags.push("QSD".to_string());
    }

    Ok(format!(
        "# {}\nRewriteRule {} {} [{}]",
        rule.id,
        pattern,
        destination,
        flags.join(",")
    ))
}

fn netlify_rule(rule: &RedirectRule, destination: &str) -> Result<String, RedirectError> {
    let code = rule.status_code.code();
    match &rule.source {
        RedirectSource::Exact(path) => Ok(format!("{}  {}  {}", path, destination, code)),
        RedirectSource::Pattern(regex) => {
            let splat = to_splat(regex.as_str()).ok_or_else(|| RedirectError::UnsupportedPattern {
                id: rule.id.clone(),
                server: ServerType::Netlify.to_string(),
                pattern: regex.as_str().to_string(),
            })?;
            Ok(format!("{}  {}  {}", splat, splat_destination(destination), code))
        }
    }
}

// * Only group 1 becomes `:splat`; `$10` and up stay as written
fn splat_destination(destination: &str) -> String {
    BACKREFERENCE
        .replace_all(destination, |caps: &Captures| match &caps[1] {
            "1" => ":splat".to_string(),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

// * Netlify has no regex support; only a trailing catch-all group maps onto `*`
fn to_splat(expression: &str) -> Option<String> {
    let body = expression.strip_prefix('^').unwrap_or(expression);
    let body = body.strip_suffix('$').unwrap_or(body);
    let prefix = body
        .strip_suffix("(.+)")
        .or_else(|| body.strip_suffix("(.*)"))?;

    let is_plain = prefix
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '/' | '-' | '_'));
    is_plain.then(|| format!("{}*", prefix))
}

fn vercel(rules: &[&RedirectRule]) -> Result<String, RedirectError> {
    let mut redirects = Vec::with_capacity(rules.len());
    for rule in rules {
        let destination = literal_destination(rule)?;
        let source = match &rule.source {
            RedirectSource::Exact(path) => path.clone(),
            RedirectSource::Pattern(regex) => {
                let expr = regex.as_str();
                let expr = expr.strip_prefix('^').unwrap_or(expr);
                expr.strip_suffix('$').unwrap_or(expr).to_string()
            }
        };

        redirects.push(json!({
            "source": source,
            "destination": destination,
            "statusCode": rule.status_code.code(),
        }));
    }

    Ok(serde_json::to_string_pretty(&json!({ "redirects": redirects }))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::rules::{Destination, RedirectStatus};

    fn rules() -> Vec<RedirectRule> {
        vec![
            RedirectRule::pattern(r"^/old-services/(.+)$", "/services/$1/")
                .unwrap()
                .with_id("old-services"),
            RedirectRule::exact("/contact-us", "/contact/")
                .with_id("contact-us")
                .with_status(RedirectStatus::PermanentRedirect)
                .preserving_query(),
            RedirectRule::exact("/gone", "/").with_id("gone").inactive(),
        ]
    }

    #[test]
    fn test_server_type_parse() {
        assert_eq!("NGINX".parse::<ServerType>().unwrap(), ServerType::Nginx);
        assert!(matches!("iis".parse::<ServerType>(), Err(RedirectError::UnknownServer(_))));
    }

    #[test]
    fn test_nginx() {
        let out = generate(&rules(), ServerType::Nginx).unwrap();
        assert!(out.contains("location ~ \"^/old-services/(.+)$\" { return 301 /services/$1/; }"));
        assert!(out.contains("location = /contact-us { return 308 /contact/$is_args$args; }"));
        assert!(!out.contains("/gone"));
    }

    #[test]
    fn test_apache() {
        let out = generate(&rules(), ServerType::Apache).unwrap();
        assert!(out.contains("RewriteEngine On"));
        assert!(out.contains("RewriteRule ^old-services/(.+)$ /services/$1/ [R=301,L,QSD]"));
        assert!(out.contains("/contact/ [R=308,L]"));
    }

    #[test]
    fn test_vercel() {
        let out = generate(&rules(), ServerType::Vercel).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        let redirects = parsed["redirects"].as_array().unwrap();

        assert_eq!(redirects.len(), 2);
        assert_eq!(redirects[0]["source"], "/old-services/(.+)");
        assert_eq!(redirects[0]["destination"], "/services/$1/");
        assert_eq!(redirects[1]["statusCode"], 308);
    }

    #[test]
    fn test_netlify() {
        let out = generate(&rules(), ServerType::Netlify).unwrap();
        assert!(out.contains("/old-services/*  /services/:splat/  301"));
        assert!(out.contains("/contact-us  /contact/  308"));
    }

    #[test]
    fn test_netlify_splat_leaves_higher_groups() {
        let rules = vec![RedirectRule::pattern(r"^/docs/(.+)$", "/guides/$1?v=$10").unwrap().with_id("docs")];
        let out = generate(&rules, ServerType::Netlify).unwrap();
        assert!(out.contains("/docs/*  /guides/:splat?v=$10  301"));
    }

    #[test]
    fn test_netlify_rejects_complex_pattern() {
        let rules = vec![RedirectRule::pattern(r"^/(\d+)/post$", "/p/$1").unwrap().with_id("num")];
        assert!(matches!(
            generate(&rules, ServerType::Netlify),
            Err(RedirectError::UnsupportedPattern { .. })
        ));
    }

    #[test]
    fn test_computed_destination_cannot_be_exported() {
        let rules = vec![RedirectRule::new(
            RedirectSource::exact("/x"),
            Destination::computed(|p| p.to_string()),
        )
        .with_id("computed")];

        assert!(matches!(
            generate(&rules, ServerType::Nginx),
            Err(RedirectError::ComputedDestination(id)) if id == "computed"
        ));
    }
}
