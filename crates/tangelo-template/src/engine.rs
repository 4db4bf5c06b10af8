//! Template expansion: the five placeholder families in their fixed order.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use regex::Regex;
use tangelo_types::context::ChatContext;

use crate::provider::{BankProvider, DEFAULT_BANK_TIMEOUT};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static ARG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\[<(\w+)>\]\}").expect("argument pattern compiles"));

static BANK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bob_\w+\b").expect("bank pattern compiles"));

/// Per-record knobs for expansion.
#[derive(Debug, Clone, Default)]
pub struct ExpandOptions {
    /// Inclusive range for `<random_number>`; default 1000..=9999.
    pub number_range: Option<(i64, i64)>,
    /// Option list for `<random_choice>`; default is three fixed options.
    pub choice_options: Option<Vec<String>>,
    /// Bank fetch timeout; default [`DEFAULT_BANK_TIMEOUT`].
    pub bank_timeout: Option<Duration>,
}

/// Expand a template against an invocation context.
///
/// Families run in order: identity, server, dynamic, arguments, bank. A
/// value substituted by an earlier family that contains a later family's
/// syntax is substituted again by that later family. That cascade is
/// deliberate, documented behavior, not an ordering accident.
///
/// Templates with no recognized placeholder syntax pass through unchanged.
pub fn expand(
    template: &str,
    ctx: &ChatContext,
    args: &[String],
    opts: &ExpandOptions,
    bank: &dyn BankProvider,
) -> String {
    let mut out = template.to_string();
    substitute_identity(&mut out, ctx);
    substitute_server(&mut out, ctx);
    substitute_dynamic(&mut out, ctx, args, opts);
    substitute_arguments(&mut out, args);
    substitute_bank(&mut out, ctx.user.id, opts, bank);
    out
}

/// Argument names a template requires, in first-occurrence order with
/// duplicates removed. The position in this list is the positional index
/// the caller must supply for that name.
pub fn required_args(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for cap in ARG_PATTERN.captures_iter(template) {
        let name = cap[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn replace_all(out: &mut String, pairs: &[(&str, String)]) {
    for (key, value) in pairs {
        if out.contains(key) {
            *out = out.replace(key, value);
        }
    }
}

fn substitute_identity(out: &mut String, ctx: &ChatContext) {
    let user = &ctx.user;
    let member = user.member.as_ref();
    let pairs = [
        ("[username]", user.name.clone()),
        ("[user_id]", user.id.to_string()),
        ("[user_mention]", user.mention()),
        (
            "[user_avatar]",
            user.avatar_url
                .clone()
                .unwrap_or_else(|| "No Avatar".to_string()),
        ),
        ("[user_discriminator]", user.discriminator.clone()),
        (
            "[user_created_at]",
            user.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ),
        (
            "[user_joined_at]",
            member
                .and_then(|m| m.joined_at)
                .map(|d| d.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        ),
        (
            "[user_roles]",
            member
                .map(|m| {
                    if m.roles.is_empty() {
                        "None".to_string()
                    } else {
                        m.roles.join(", ")
                    }
                })
                .unwrap_or_else(|| "None".to_string()),
        ),
        (
            "[user_status]",
            member
                .map(|m| m.status.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        ),
    ];
    replace_all(out, &pairs);
}

fn substitute_server(out: &mut String, ctx: &ChatContext) {
    let server = &ctx.server;
    let pairs = [
        ("{servername}", server.name.clone()),
        ("{server_id}", server.id.to_string()),
        ("{member_count}", server.member_count.to_string()),
        (
            "{server_icon}",
            server
                .icon_url
                .clone()
                .unwrap_or_else(|| "No Icon".to_string()),
        ),
        (
            "{server_created_at}",
            server.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ),
        // The platform retired server regions; the placeholder survives for
        // old templates.
        ("{server_region}", "N/A".to_string()),
        (
            "{server_owner}",
            server
                .owner_name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
        ),
        ("{server_boosts}", server.boost_count.to_string()),
        (
            "{server_banner}",
            server
                .banner_url
                .clone()
                .unwrap_or_else(|| "No Banner".to_string()),
        ),
        (
            "{server_description}",
            server
                .description
                .clone()
                .unwrap_or_else(|| "No Description".to_string()),
        ),
    ];
    replace_all(out, &pairs);
}

fn substitute_dynamic(out: &mut String, ctx: &ChatContext, args: &[String], opts: &ExpandOptions) {
    let mut rng = rand::thread_rng();
    // A persisted record can carry an inverted range that never went through
    // validation; fall back to the default rather than panic in the sampler.
    let (min, max) = match opts.number_range {
        Some((min, max)) if min <= max => (min, max),
        _ => (1000, 9999),
    };
    let default_choices = ["Option1", "Option2", "Option3"];
    let choice = match opts.choice_options.as_deref() {
        Some(options) if !options.is_empty() => {
            options[rng.gen_range(0..options.len())].clone()
        },
        _ => default_choices[rng.gen_range(0..default_choices.len())].to_string(),
    };
    let now = Utc::now();
    let pairs = [
        ("<input1>", args.first().cloned().unwrap_or_default()),
        ("<input2>", args.get(1).cloned().unwrap_or_default()),
        ("<input3>", args.get(2).cloned().unwrap_or_default()),
        ("<current_time>", now.format("%H:%M:%S").to_string()),
        ("<current_date>", now.format("%Y-%m-%d").to_string()),
        ("<random_number>", rng.gen_range(min..=max).to_string()),
        ("<random_choice>", choice),
        ("<channel_name>", ctx.channel.name.clone()),
        ("<channel_id>", ctx.channel.id.to_string()),
        ("<message_id>", ctx.message_id.to_string()),
    ];
    replace_all(out, &pairs);
}

fn substitute_arguments(out: &mut String, args: &[String]) {
    for (i, name) in required_args(out).iter().enumerate() {
        let value = args.get(i).map(|s| s.trim()).unwrap_or("");
        *out = out.replace(&format!("{{[<{name}>]}}"), value);
    }
}

fn substitute_bank(out: &mut String, identity: u64, opts: &ExpandOptions, bank: &dyn BankProvider) {
    let timeout = opts.bank_timeout.unwrap_or(DEFAULT_BANK_TIMEOUT);
    let literals: Vec<String> = BANK_PATTERN
        .find_iter(out)
        .map(|m| m.as_str().to_string())
        .collect();
    for literal in literals {
        if !out.contains(&literal) {
            continue;
        }
        let value = bank
            .fetch(identity, &literal, timeout)
            .unwrap_or_else(|| "N/A".to_string());
        *out = out.replace(&literal, &value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{NoBank, StaticBank};
    use tangelo_types::context::ChatContext;

    fn expand_plain(template: &str, args: &[&str]) -> String {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        expand(
            template,
            &ChatContext::sample(),
            &args,
            &ExpandOptions::default(),
            &NoBank,
        )
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(expand_plain("just words, no magic", &[]), "just words, no magic");
    }

    #[test]
    fn greet_scenario() {
        let out = expand_plain("Hello, {[<name>]}! Welcome to {servername}.", &["Alice"]);
        assert_eq!(out, "Hello, Alice! Welcome to Testland.");
    }

    #[test]
    fn identity_placeholders() {
        assert_eq!(expand_plain("[username]", &[]), "Alice");
        assert_eq!(expand_plain("[user_id]", &[]), "4242");
        assert_eq!(expand_plain("[user_mention]", &[]), "<@4242>");
        assert_eq!(expand_plain("[user_discriminator]", &[]), "0001");
        assert_eq!(expand_plain("[user_roles]", &[]), "Admin, Gardener");
        assert_eq!(expand_plain("[user_status]", &[]), "Online");
        assert_eq!(
            expand_plain("[user_created_at]", &[]),
            "2020-03-14 09:26:53"
        );
        assert_eq!(expand_plain("[user_joined_at]", &[]), "2021-06-01 12:00:00");
    }

    #[test]
    fn identity_fallbacks_for_non_member() {
        let mut ctx = ChatContext::sample();
        ctx.user.member = None;
        ctx.user.avatar_url = None;
        let opts = ExpandOptions::default();
        let out = expand(
            "[user_joined_at]/[user_roles]/[user_status]/[user_avatar]",
            &ctx,
            &[],
            &opts,
            &NoBank,
        );
        assert_eq!(out, "N/A/None/N/A/No Avatar");
    }

    #[test]
    fn server_placeholders() {
        assert_eq!(expand_plain("{servername}", &[]), "Testland");
        assert_eq!(expand_plain("{server_id}", &[]), "9001");
        assert_eq!(expand_plain("{member_count}", &[]), "128");
        assert_eq!(expand_plain("{server_owner}", &[]), "Bob");
        assert_eq!(expand_plain("{server_boosts}", &[]), "3");
        // Sample context has no icon, banner, or description set.
        assert_eq!(expand_plain("{server_icon}", &[]), "No Icon");
        assert_eq!(expand_plain("{server_banner}", &[]), "No Banner");
        assert_eq!(expand_plain("{server_description}", &[]), "No Description");
        assert_eq!(expand_plain("{server_region}", &[]), "N/A");
    }

    #[test]
    fn dynamic_inputs_and_context() {
        assert_eq!(expand_plain("<input1>-<input2>-<input3>", &["a", "b"]), "a-b-");
        assert_eq!(expand_plain("<channel_name>", &[]), "general");
        assert_eq!(expand_plain("<channel_id>", &[]), "7007");
        assert_eq!(expand_plain("<message_id>", &[]), "555000111");
    }

    #[test]
    fn dynamic_time_shapes() {
        let time = expand_plain("<current_time>", &[]);
        assert_eq!(time.len(), 8);
        assert_eq!(time.matches(':').count(), 2);
        let date = expand_plain("<current_date>", &[]);
        assert_eq!(date.len(), 10);
        assert_eq!(date.matches('-').count(), 2);
    }

    #[test]
    fn random_number_honors_configured_range() {
        let opts = ExpandOptions {
            number_range: Some((5, 7)),
            ..ExpandOptions::default()
        };
        for _ in 0..50 {
            let out = expand("<random_number>", &ChatContext::sample(), &[], &opts, &NoBank);
            let n: i64 = out.parse().unwrap();
            assert!((5..=7).contains(&n), "out of range: {n}");
        }
    }

    #[test]
    fn inverted_number_range_falls_back_to_default() {
        let opts = ExpandOptions {
            number_range: Some((9, 1)),
            ..ExpandOptions::default()
        };
        let out = expand("<random_number>", &ChatContext::sample(), &[], &opts, &NoBank);
        let n: i64 = out.parse().unwrap();
        assert!((1000..=9999).contains(&n));
    }

    #[test]
    fn random_number_default_range() {
        let out = expand_plain("<random_number>", &[]);
        let n: i64 = out.parse().unwrap();
        assert!((1000..=9999).contains(&n));
    }

    #[test]
    fn random_choice_honors_configured_options() {
        let opts = ExpandOptions {
            choice_options: Some(vec!["red".to_string(), "blue".to_string()]),
            ..ExpandOptions::default()
        };
        for _ in 0..20 {
            let out = expand("<random_choice>", &ChatContext::sample(), &[], &opts, &NoBank);
            assert!(out == "red" || out == "blue");
        }
    }

    #[test]
    fn required_args_first_occurrence_dedup() {
        let names = required_args("{[<a>]} {[<b>]} {[<a>]} {[<c>]}");
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(required_args("no args here").is_empty());
    }

    #[test]
    fn argument_substitution_replaces_every_occurrence() {
        let out = expand_plain("{[<who>]} and {[<who>]} again", &["Sam"]);
        assert_eq!(out, "Sam and Sam again");
        // No argument token survives full expansion with enough args.
        assert!(!out.contains("{[<"));
    }

    #[test]
    fn argument_values_are_trimmed() {
        let out = expand_plain("hi {[<name>]}!", &["  Sam  "]);
        assert_eq!(out, "hi Sam!");
    }

    #[test]
    fn undersupplied_arguments_become_empty() {
        // Call sites reject under-supply before expansion; the engine
        // itself degrades to empty strings.
        assert_eq!(expand_plain("{[<a>]}:{[<b>]}", &["x"]), "x:");
    }

    #[test]
    fn bank_placeholder_fetches_and_substitutes() {
        let mut bank = StaticBank::new();
        bank.insert(4242, "ob_balance", "250");
        let out = expand(
            "You have ob_balance coins",
            &ChatContext::sample(),
            &[],
            &ExpandOptions::default(),
            &bank,
        );
        assert_eq!(out, "You have 250 coins");
    }

    #[test]
    fn bank_failure_degrades_to_na() {
        let out = expand_plain("balance: ob_balance, xp: ob_xp", &[]);
        assert_eq!(out, "balance: N/A, xp: N/A");
    }

    #[test]
    fn distinct_bank_placeholders_fetch_independently() {
        let mut bank = StaticBank::new();
        bank.insert(4242, "ob_level", "12");
        let out = expand(
            "ob_level / ob_xp",
            &ChatContext::sample(),
            &[],
            &ExpandOptions::default(),
            &bank,
        );
        assert_eq!(out, "12 / N/A");
    }

    #[test]
    fn earlier_family_value_cascades_into_later_family() {
        // A username containing server syntax is substituted again by the
        // server family. Documented sharp edge.
        let mut ctx = ChatContext::sample();
        ctx.user.name = "see {servername}".to_string();
        let out = expand("[username]", &ctx, &[], &ExpandOptions::default(), &NoBank);
        assert_eq!(out, "see Testland");
    }

    #[test]
    fn argument_value_cascades_into_bank_family() {
        let mut bank = StaticBank::new();
        bank.insert(4242, "ob_balance", "99");
        let args = vec!["ob_balance".to_string()];
        let out = expand(
            "{[<x>]}",
            &ChatContext::sample(),
            &args,
            &ExpandOptions::default(),
            &bank,
        );
        assert_eq!(out, "99");
    }
}
