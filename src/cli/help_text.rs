pub(super) const ROOT_LONG_ABOUT: &str = "\
Keep local Hexabase scripts and projects in sync

hxutil compares the action and function scripts stored in a Hexabase project
with the script files in a local directory, and compares two projects with
each other.

COMMANDS:

  login
    Log in and print the session token. Useful to check credentials.

  action diff
    Compare every pre/post action script and every function script of a
    project with the files under a local directory. Prints each difference
    as it is found, then a summary.

  project diff
    Compare settings, environment variables, functions and actions of two
    projects in both directions.

  api call
    Send a single request to the API and print the response.

  config path | config show
    Show where the configuration lives and what it contains.

CREDENTIALS:

  The email comes from --email, HXUTIL_EMAIL, or the last login user in the
  config file. The password comes from --password, HXUTIL_PASSWORD, a password
  stored in the config file, or an interactive prompt.

EXIT CODES:

  0    No differences
  1    Differences found
  255  Error (login failure, unusable directory, unreachable API, ...)
";

pub(super) const ACTION_DIFF_LONG_ABOUT: &str = "\
Compare local script files with the scripts of a project

For every action of every datastore, the pre and post scripts are looked up
locally as <display_id>*pre.js and <display_id>*post.js; function scripts as
<display_id>*.js. The first matching file found under --dir is used.

Remote scripts that do not exist are skipped. Remote scripts without a local
file are reported as LOCAL NOT FOUND. Whitespace-only differences are ignored.

Insertions are text present remotely but not locally; deletions are text
present locally but not remotely.

The summary ends with three counters:

  local scripts not found
  unexpected API responses
  errors while walking project files
";

pub(super) const PROJECT_DIFF_LONG_ABOUT: &str = "\
Compare settings, functions and actions of two projects

Project names, display ID and environment variables are compared first.
Functions are matched by display ID, actions by display ID and datastore name.
Anything that exists in only one of the projects is reported, whichever side
it is on.

Long environment variable values are compared with a text diff so that
whitespace-only changes are not reported.
";
