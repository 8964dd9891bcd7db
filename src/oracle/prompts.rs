//! Prompt templates and corrective diagnostics.

fn list_or_empty(items: &[String]) -> String {
    if items.is_empty() {
        "<empty>".to_string()
    } else {
        items.join("\n")
    }
}

const SCORE_SCALE: &str = "\
- Score 0: totally irrelevant; it does not help address the user query at all.
- Score 1: weakly relevant; the user query can be addressed even without it.
- Score 2: relevant; without it the user query can only be partially addressed.
- Score 3: strongly relevant; the user query can never be addressed without it.";

// File name extraction

pub const FILE_NAMES_SCHEMA: &str = r#"{
    "thoughts": "your comprehension of the user query", // in detail; it should help you find every possible file name
    "files": ["<file_name_1>", "<file_name_2>", ...], // every possible file name, or [] when the query names none
    "reason": "why the names you found are file names embedded in the query" // step by step, one name at a time
}"#;

pub fn extract_file_names(repo: &str, query: &str) -> String {
    format!(
        "\
You are a File Name Extractor, tasked to extract every possible **file name** embedded in a \"User Query\". \
Others will use the extracted names to solve the user query, so do not miss any of them.

The \"User Query\" is a question or request about the repository: {repo}. \
Solving it may require reading or updating files that the query mentions, explicitly or not. \
Comprehend the user query in detail and find every file name embedded in it.

Note,
1. The query may embed several file names; find all of them.
2. If the query embeds no file name, set \"files\" to an empty array ([]) and explain why in \"reason\".

## User Query ##

```
{query}
```

"
    )
}

// File choosing

pub const CHOOSE_FILES_SCHEMA: &str = r#"{
    "choose_list": ["<certainly_relevant_file_1>", "<certainly_relevant_file_2>", ...], // chosen from "File List"
    "reason": "why you chose them" // explain in detail, step by step
}"#;

pub fn choose_files(repo: &str, query: &str, candidates: &[String]) -> String {
    format!(
        "\
## YOUR TASK ##

You are a File Chooser, analyzing how relevant files are to a \"User Query\".
I will give you the \"User Query\" and a \"File List\".
- The \"User Query\" is an authentic request from a user; comprehend it thoroughly.
- The \"File List\" holds similar files of the repository {repo} to choose from. You cannot read the files.
Your task is to:
- Select the files from \"File List\" that are CERTAINLY RELEVANT to the user query, i.e. that must be changed to address it.
- Return a JSON object with the chosen files and the reason for choosing them.
Note,
1. ONLY choose files listed in \"File List\".
2. If you are NOT SURE a file is relevant, leave it out.

## User Query ##

```
{query}
```

## File List ##

```
{candidates}
```

",
        candidates = candidates.join("\n"),
    )
}

pub fn file_not_in_list(file: &str, candidates: &[String]) -> String {
    format!(
        "\
**FAILURE**: Your response chose a file that is not in the list: {file}.

ONLY choose files from the \"File List\" I gave you:

```
{candidates}
```

Please fix the issue shown above and respond again.

## Your Format ##

{CHOOSE_FILES_SCHEMA}

## Your Response (JSON format) ##

",
        candidates = candidates.join("\n"),
    )
}

// Tree exploration

pub fn next_file_schema(example_file: &str) -> String {
    format!(
        r#"{{
    "file": "<file_path_or_null>", // a path like "{example_file}", or null when every file you are CERTAIN is relevant is already in the File List
    "reason": "why this file is relevant to the user query" // explain in detail: its name reflects the query, its functionality solves the query, or another reasonable explanation
}}"#
    )
}

pub fn next_file(repo: &str, query: &str, tree: &str, found: &[String]) -> String {
    format!(
        "\
You are a File Finder, collecting files of the repository {repo} that are relevant to a \"User Query\". \
Others will use the files to solve the user query, so do not miss any relevant file.

I will give you the \"User Query\", a \"Repository Tree\" listing the repository's files, and a \"File List\" \
with the files already known to be relevant. \
Explore the tree to find a further file that you are CERTAIN is relevant to the user query. \
Never answer a file that is already in the File List; find another one instead. \
Judge relevance only from:
1. the directory structure of the repository;
2. each file's name and its position in the tree;
3. your prior knowledge of special files (pom.xml, build.gradle, requirements.txt, package.json, etc.).
You cannot read any file.

Note,
1. Respond with exactly one file per request: the MOST relevant one.
2. If every file you are CERTAIN is relevant is already in the File List, set \"file\" to null and explain why in \"reason\".

## User Query ##

```
{query}
```

## Repository Tree ##

```
{tree}
```

## File List ##

```
{found}
```

",
        found = list_or_empty(found),
    )
}

pub fn file_not_exists(file: &str, similar: &[String]) -> String {
    let similar: Vec<String> = similar.iter().map(|path| format!("- {path}")).collect();
    format!(
        "\
**FAILURE**: File {file} does not exist in the repository.

Did you mean one of the following files?

{similar}

## Your Response (JSON format) ##

",
        similar = similar.join("\n"),
    )
}

pub fn file_already_found(file: &str) -> String {
    format!(
        "\
**FAILURE**: File {file} is ALREADY in the file list.

Find another file that you are CERTAIN is relevant to the user query. \
If every such file is already in the file list, set \"file\" to null and explain why in \"reason\".

## Your Response (JSON format) ##

"
    )
}

// Scoring

pub const SCORE_SCHEMA: &str = r#"{
    "score": <score>, // the relevance score, an integer chosen from [0, 1, 2, 3]
    "reason": "why you gave this score" // explain in detail, step by step
}"#;

pub fn score_preview(repo: &str, query: &str, file: &str, preview: &str, others: &[String]) -> String {
    format!(
        "\
## YOUR TASK ##

You are a File Relevance Decider. Determine how relevant a file is to the \"User Query\" and give a relevance score.

I will give you the \"User Query\" and a preview of the file {file} from the repository {repo}; \
the preview lists its definitions such as functions and classes. \
I will also give you a list of other files that may relate to the user query; they may help your decision.

A file is relevant when it is an important part of addressing the user query, even indirectly. Proceed as follows:
1. Think about which files are required to address the user query;
2. Analyze whether the file is one of them and what it provides;
3. Check whether it offers useful information to address the user query, directly or indirectly;
4. Conclude and give a relevance score.

The relevance score is an integer chosen from [0, 1, 2, 3]:
{SCORE_SCALE}

## User Query ##

```
{query}
```

## File Preview ##

```
{file}

{preview}
```

## File List ##

```
{others}
```

",
        others = list_or_empty(others),
    )
}

pub fn invalid_score(score: i64) -> String {
    format!(
        "\
**FAILURE**: The relevance score ({score}) you gave is NOT chosen from [0, 1, 2, 3].

The relevance score must be an integer chosen from [0, 1, 2, 3]:
{SCORE_SCALE}

## Your Response (JSON format) ##

"
    )
}

const SNIPPET_STEPS: &str = "\
A file snippet is relevant when it is an important part of addressing the user query, even indirectly. Proceed as follows:
1. Think about which files are required to address the user query;
2. Analyze whether the snippet belongs to those files and what it does;
3. Check whether it offers useful information to address the user query, directly or indirectly;";

fn snippet_file_name(snippet: &str) -> &str {
    let path = snippet.rsplit_once(':').map_or(snippet, |(path, _)| path);
    path.rsplit('/').next().unwrap_or(path)
}

pub fn score_snippet(query: &str, snippet: &str, content: &str) -> String {
    format!(
        "\
You are a Snippet Relevance Scorer. Determine whether a \"File Snippet\" is relevant to a \"User Query\" \
and give a relevance score; a snippet is relevant when it can be used to address the user query.

The \"File Snippet\" is a portion of the file **{name}**, wrapped by \"===START OF SNIPPET===\" and \
\"===END OF SNIPPET===\", possibly with some surrounding lines for reference.

{SNIPPET_STEPS}
4. Conclude and give a relevance score.

The relevance score is an integer chosen from [0, 1, 2, 3]:
{SCORE_SCALE}

## User Query ##

```
{query}
```

## File Snippet ##

```
//// Snippet: {snippet}
{content}
```

",
        name = snippet_file_name(snippet),
    )
}

pub const JUDGE_SCHEMA: &str = r#"{
    "relevant": <true_or_false>, // whether the file snippet is relevant to the user query
    "reason": "why the file snippet is or is not relevant" // explain step by step, following the steps above
}"#;

pub fn judge_snippet(query: &str, snippet: &str, content: &str) -> String {
    format!(
        "\
You are a Relevance Determiner. Analyze whether a \"File Snippet\" is relevant to a \"User Query\".

The \"File Snippet\" is a portion of the file **{name}**, wrapped by \"===START OF SNIPPET===\" and \
\"===END OF SNIPPET===\", possibly with some surrounding lines for reference.

{SNIPPET_STEPS}
4. Conclude whether the snippet is relevant.

## User Query ##

```
{query}
```

## File Snippet ##

```
//// Snippet: {snippet}
{content}
```

",
        name = snippet_file_name(snippet),
    )
}

// Snippet finding

pub const NEXT_SNIPPET_SCHEMA: &str = r#"{
    "start_line": <line_number>, // first line of the snippet (included), or -1 when no relevant snippet is left
    "end_line": <line_number>, // line after the snippet (excluded), or -1 when no relevant snippet is left
    "reason": "why this snippet might be relevant to the user query" // first restate the user query, then what the snippet does, then how they relate
}"#;

pub fn next_snippet(file: &str, query: &str, preview: &str, accepted: &[String]) -> String {
    format!(
        "\
You are a Snippet Finder, collecting snippets of the file {file} that are relevant to a \"User Query\". \
Others will use the snippets to solve the user query, so do not miss any relevant snippet.

I will give you the \"User Query\" and a \"File Preview\" giving an overview of the file, \
where some content is elided with \"...\". \
From the preview, decide which line range (e.g., 100-120) might be relevant to the user query, \
or that the file is not relevant at all, and explain your decision in detail. \
The \"Snippet List\" holds the snippets already found; find snippets beyond them.

Note,
1. Respond with exactly one snippet per request: the MOST relevant one.
2. If every relevant snippet is already in the snippet list, set \"start_line\" and \"end_line\" to -1 and explain why in \"reason\".

## User Query ##

```
{query}
```

## File Preview ##

```
{preview}
```

## Snippet List ##

```
{accepted}
```

",
        accepted = list_or_empty(accepted),
    )
}

const STOP_HINT: &str = "\
Both values must be greater than or equal to -1, where -1 means the file holds no further relevant snippet.";

const FIND_ANOTHER: &str = "\
Find another snippet that might be relevant to the user query. \
If every relevant snippet is already in the snippet list, set \"start_line\" and \"end_line\" to -1 and explain why in \"reason\".";

pub fn negative_line(which: &str, line: i64) -> String {
    format!(
        "\
**FAILURE**: Invalid snippet {which} ({line}).

{STOP_HINT}

Correct the {which} or choose another snippet.

## Your Response (JSON format) ##

"
    )
}

pub fn start_not_before_end(start: i64, end: i64) -> String {
    format!(
        "\
**FAILURE**: start_line ({start}) must be less than end_line ({end}).

{STOP_HINT}

Correct them or choose another snippet.

## Your Response (JSON format) ##

"
    )
}

pub fn line_out_of_file(which: &str, line: i64, num_lines: usize) -> String {
    format!(
        "\
**FAILURE**: The {which} ({line}) exceeds the number of lines of the file ({num_lines}).

{STOP_HINT}

Correct the {which}.

## Your Response (JSON format) ##

"
    )
}

pub fn snippet_already_found(start: usize, end: usize) -> String {
    format!(
        "\
**FAILURE**: Snippet {start}-{end} is ALREADY in the snippet list.

{FIND_ANOTHER}

## Your Response (JSON format) ##

"
    )
}

pub fn snippet_covered(start: usize, end: usize, by_start: usize, by_end: usize) -> String {
    format!(
        "\
**FAILURE**: Snippet {start}-{end} is ALREADY covered by snippet {by_start}-{by_end} of the snippet list.

Never choose a snippet covered by the snippet list. {FIND_ANOTHER}

## Your Response (JSON format) ##

"
    )
}

pub fn snippet_not_relevant(start: usize, end: usize, reason: &str) -> String {
    format!(
        "\
After reviewing snippet {start}-{end} in detail, we are CERTAIN it is NOT relevant to the user query because:

```
{reason}
```

{FIND_ANOTHER}

## Your Response (JSON format) ##

"
    )
}
