//! Static HTML served by the placeholder handler.
//!
//! Kept as a single const so tests can compare response bodies
//! byte-for-byte against it.

/// Page returned for any request no route claimed.
pub const PLACEHOLDER_PAGE: &str = "<html lang=\"en\">\n\
\t<head>\n\
\t\t<title>Web Server</title>\n\
\t</head>\n\
\t<body>\n\
\t\t<div class='main'>\n      \
\t\tNothing to see here folks.\n\
\t\t</div>\n\
\t</body>\n\
</html>\n";
