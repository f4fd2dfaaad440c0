//! Browser-side DOM walk that builds the accessibility tree (§4.8/C8).
//! Reuses `element_locator::js::HELPER_LIBRARY`'s `role`/`accessibleName`
//! computation so the same notion of "role" backs both locating and
//! snapshotting an element.

use element_locator::js::wrap;

const LANDMARK_ROLES: &[&str] = &[
    "banner",
    "navigation",
    "main",
    "contentinfo",
    "complementary",
    "form",
    "search",
    "region",
];

pub fn build_walk_script(frame_id: &str, snapshot_id: &str, pierce_shadow: bool, include_frames: bool) -> String {
    let landmarks = serde_json::to_string(LANDMARK_ROLES).unwrap_or_else(|_| "[]".to_string());
    let frame_json = serde_json::to_string(frame_id).unwrap_or_else(|_| "\"f0\"".to_string());
    let snapshot_json = serde_json::to_string(snapshot_id).unwrap_or_else(|_| "\"s0\"".to_string());

    let body = format!(
        "const frameId = {frame_json};\n\
         const snapshotId = {snapshot_json};\n\
         const pierceShadow = {pierce_shadow};\n\
         const includeFrames = {include_frames};\n\
         const landmarkRoles = new Set({landmarks});\n\
         const skipTags = new Set(['script', 'style', 'noscript', 'template']);\n\
         window.__cdpSkillRefs = window.__cdpSkillRefs || {{}};\n\
         window.__cdpSkillRefMeta = window.__cdpSkillRefMeta || {{}};\n\
         let counter = 0;\n\
         const nodes = [];\n\
         \n\
         function inViewport(el) {{\n\
           const r = el.getBoundingClientRect();\n\
           return r.bottom > 0 && r.right > 0 && r.top < window.innerHeight && r.left < window.innerWidth;\n\
         }}\n\
         \n\
         function computeStates(el) {{\n\
           const states = [];\n\
           if (el.disabled) states.push('disabled');\n\
           if (el.checked) states.push('checked');\n\
           if (el.getAttribute && el.getAttribute('aria-expanded') === 'true') states.push('expanded');\n\
           if (el.getAttribute && el.getAttribute('aria-selected') === 'true') states.push('selected');\n\
           if (document.activeElement === el) states.push('focused');\n\
           if (el.required) states.push('required');\n\
           return states;\n\
         }}\n\
         \n\
         function headingLevel(el) {{\n\
           const m = /^H([1-6])$/.exec(el.tagName || '');\n\
           if (m) return Number(m[1]);\n\
           const aria = el.getAttribute && el.getAttribute('aria-level');\n\
           return aria ? Number(aria) : null;\n\
         }}\n\
         \n\
         function cssPath(el) {{\n\
           if (el.id) return '#' + CSS.escape(el.id);\n\
           const parts = [];\n\
           let node = el;\n\
           while (node && node.nodeType === 1 && parts.length < 6) {{\n\
             let part = node.tagName.toLowerCase();\n\
             const parent = node.parentElement;\n\
             if (parent) {{\n\
               const siblings = Array.from(parent.children).filter((s) => s.tagName === node.tagName);\n\
               if (siblings.length > 1) part += ':nth-of-type(' + (siblings.indexOf(node) + 1) + ')';\n\
             }}\n\
             parts.unshift(part);\n\
             node = parent;\n\
           }}\n\
           return parts.join(' > ');\n\
         }}\n\
         \n\
         function walk(container, depth, landmarkPath, crossOriginFrame) {{\n\
           const children = container.children ? Array.from(container.children) : [];\n\
           for (const el of children) {{\n\
             const tag = el.tagName ? el.tagName.toLowerCase() : '';\n\
             if (skipTags.has(tag)) continue;\n\
             const style = window.getComputedStyle(el);\n\
             if (style.display === 'none' || style.visibility === 'hidden' || el.hidden) continue;\n\
             const role = window.__cdpRole(el);\n\
             const name = window.__cdpAccessibleName(el);\n\
             const path = landmarkRoles.has(role) ? [...landmarkPath, role] : landmarkPath;\n\
             const ref = 'f' + frameId + 's' + snapshotId + 'e' + (++counter);\n\
             window.__cdpSkillRefs[ref] = el;\n\
             window.__cdpSkillRefMeta[ref] = {{ selector: cssPath(el), role, name, snapshotId }};\n\
             nodes.push({{\n\
               ref,\n\
               role,\n\
               name,\n\
               level: headingLevel(el),\n\
               states: computeStates(el),\n\
               inViewport: inViewport(el),\n\
               depth,\n\
               crossOriginFrame,\n\
               landmarkPath: path,\n\
             }});\n\
             walk(el, depth + 1, path, crossOriginFrame);\n\
             if (pierceShadow && el.shadowRoot) walk(el.shadowRoot, depth + 1, path, crossOriginFrame);\n\
             if (includeFrames && tag === 'iframe') {{\n\
               try {{\n\
                 const doc = el.contentDocument;\n\
                 if (doc && doc.documentElement) {{\n\
                   walk(doc.documentElement, depth + 1, path, false);\n\
                 }} else {{\n\
                   throw new Error('no-document');\n\
                 }}\n\
               }} catch (e) {{\n\
                 const ref2 = 'f' + frameId + 's' + snapshotId + 'e' + (++counter);\n\
                 nodes.push({{\n\
                   ref: ref2, role: 'iframe', name: '[cross-origin frame]', level: null,\n\
                   states: [], inViewport: inViewport(el), depth: depth + 1, crossOriginFrame: true, landmarkPath: path,\n\
                 }});\n\
               }}\n\
             }}\n\
           }}\n\
         }}\n\
         \n\
         walk(document.body || document.documentElement, 0, [], false);\n\
         \n\
         return {{\n\
           url: location.href,\n\
           scrollX: window.scrollX,\n\
           scrollY: window.scrollY,\n\
           docWidth: document.documentElement.scrollWidth,\n\
           docHeight: document.documentElement.scrollHeight,\n\
           nodes,\n\
         }};",
    );

    wrap(&body)
}
