//! Shell completion support for --set overrides
//!
//! Completion scripts call the hidden `complete-paths` subcommand, which
//! lists every dotted key of [`ProfileConfig`] derived from its JSON Schema.

use schemars::schema::{RootSchema, Schema, SchemaObject, SingleOrVec};
use schemars::schema_for;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::ProfileConfig;

/// Generate bash completion script with --set support
pub fn generate_bash_completion(bin_name: &str) -> String {
    format!(
        r#"# Bash completion for {bin_name}
#   source <({bin_name} completions bash)

_{bin_name}_complete_set_key() {{
    local keys
    keys=$({bin_name} complete-paths 2>/dev/null)
    COMPREPLY=( $(compgen -W "$keys" -- "${{COMP_WORDS[COMP_CWORD]}}") )
}}

_{bin_name}() {{
    local cur prev words cword
    _init_completion || return

    if [[ "$prev" == "--set" ]]; then
        [[ "$cur" == *"="* ]] && return 0
        _{bin_name}_complete_set_key
        local i
        for i in "${{!COMPREPLY[@]}}"; do
            COMPREPLY[$i]="${{COMPREPLY[$i]}}="
        done
        compopt -o nospace
        return 0
    fi

    case "$prev" in
        -P|--profile)
            _filedir toml
            return 0
            ;;
        -o|--output)
            _filedir json
            return 0
            ;;
        -l|--log-level)
            COMPREPLY=( $(compgen -W "trace debug info warn error" -- "$cur") )
            return 0
            ;;
    esac

    if [[ $cword -eq 1 ]]; then
        COMPREPLY=( $(compgen -W "run merge completions schema help" -- "$cur") )
        return 0
    fi

    case "${{words[1]}}" in
        run)
            COMPREPLY=( $(compgen -W "-P --profile --set -l --log-level -h --help" -- "$cur") )
            ;;
        merge)
            if [[ "$cur" == -* ]]; then
                COMPREPLY=( $(compgen -W "-o --output -n --name -h --help" -- "$cur") )
            else
                _filedir json
            fi
            ;;
        completions)
            COMPREPLY=( $(compgen -W "bash zsh fish" -- "$cur") )
            ;;
    esac
}}

complete -F _{bin_name} {bin_name}
"#
    )
}

/// Generate zsh completion script with --set support
pub fn generate_zsh_completion(bin_name: &str) -> String {
    format!(
        r#"#compdef {bin_name}
# Zsh completion for {bin_name}

_{bin_name}_complete_set_keys() {{
    local -a keys
    keys=($({bin_name} complete-paths 2>/dev/null))
    _describe 'config keys' keys -S '='
}}

_{bin_name}() {{
    local line state

    _arguments -C \
        '(-l --log-level)'{{-l,--log-level}}'[Log level]:level:(trace debug info warn error)' \
        '1: :->command' \
        '*:: :->args'

    case $state in
        command)
            local -a subcommands
            subcommands=(
                'run:Accumulate generator weights for a profile'
                'merge:Merge result files of separate jobs'
                'completions:Generate shell completions'
                'schema:Generate JSON Schema'
                'help:Print help'
            )
            _describe 'command' subcommands
            ;;
        args)
            case $line[1] in
                run)
                    _arguments \
                        '(-P --profile)'{{-P,--profile}}'[Profile path]:file:_files -g "*.toml"' \
                        '*--set[Override config]:key=value:_{bin_name}_complete_set_keys'
                    ;;
                merge)
                    _arguments \
                        '(-o --output)'{{-o,--output}}'[Merged output]:file:_files -g "*.json"' \
                        '(-n --name)'{{-n,--name}}'[Merged job name]:name:' \
                        '*:input:_files -g "*.json"'
                    ;;
                completions)
                    _arguments '1:shell:(bash zsh fish)'
                    ;;
            esac
            ;;
    esac
}}

_{bin_name} "$@"
"#
    )
}

/// All valid dotted paths for --set, extracted from the profile schema
pub fn get_config_paths() -> Vec<String> {
    let schema: RootSchema = schema_for!(ProfileConfig);
    let mut paths = BTreeSet::new();
    collect_object(&schema.schema, "", &mut paths, &schema.definitions);
    paths.into_iter().collect()
}

fn collect_object(
    schema: &SchemaObject,
    prefix: &str,
    paths: &mut BTreeSet<String>,
    definitions: &BTreeMap<String, Schema>,
) {
    if !prefix.is_empty() {
        paths.insert(prefix.to_string());
    }

    if let Some(obj) = &schema.object {
        for (name, property) in &obj.properties {
            let path = if prefix.is_empty() { name.clone() } else { format!("{prefix}.{name}") };
            collect_schema(property, &path, paths, definitions);
        }
    }

    // Tagged enums (oneOf), Option<T> (anyOf) and wrapped references (allOf)
    if let Some(subschemas) = &schema.subschemas {
        let variants = [&subschemas.one_of, &subschemas.any_of, &subschemas.all_of];
        for schema in variants.into_iter().flatten().flatten() {
            collect_schema(schema, prefix, paths, definitions);
        }
    }

    if let Some(SingleOrVec::Single(item)) = schema.array.as_ref().and_then(|a| a.items.as_ref()) {
        collect_schema(item, &format!("{prefix}.0"), paths, definitions);
    }
}

fn collect_schema(
    schema: &Schema,
    prefix: &str,
    paths: &mut BTreeSet<String>,
    definitions: &BTreeMap<String, Schema>,
) {
    let Schema::Object(obj) = schema else {
        return;
    };
    match obj.reference.as_deref().and_then(|r| r.strip_prefix("#/definitions/")) {
        Some(name) => {
            if let Some(definition) = definitions.get(name) {
                collect_schema(definition, prefix, paths, definitions);
            }
        }
        None => collect_object(obj, prefix, paths, definitions),
    }
}
