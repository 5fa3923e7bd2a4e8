/*!
# Console

`stlogic [config-file]` starts the engine at a 10 ms interval and reads
commands between ticks. Program ids are 1 to 4. Ctrl-C pauses every
program through its debugger; `continue <id>` resumes it. Set `RUST_LOG`
to change logging, for example `RUST_LOG=stlogic=debug` together with
`debug on` to log every execution.

```text
st> upload 1 tank.st
Logic1 compiled: 24 instructions, 4 variables
st> bind 1 level hr 10
st> bind 1 pump coil 0
st> enable 1
st> break 1 6
st> continue 1
Logic1 paused at PC 6 (breakpoint)
st> show 1 vars
st> step 1
st> stop 1
```

| Command | Effect |
|---|---|
| `upload <id> <file>` | store and compile a source file |
| `compile <id>` | compile the stored source |
| `enable <id>`, `disable <id>` | switch a program on or off |
| `delete <id>` | free the slot, its source, exports and bindings |
| `bind <id> <var> <hr\|ir\|coil\|di> <addr>` | connect a VAR_INPUT or VAR_OUTPUT |
| `unbind <id> <var>` | remove a binding |
| `debug on\|off` | log every program execution |
| `interval <ms>` | 10, 20, 25, 50, 75 or 100 |
| `reset <id\|all>` | clear statistics |
| `pause`, `continue`, `step`, `stop <id>` | debugger control |
| `break <id> <pc>`, `clear <id> [pc]` | breakpoints, 8 per program |
| `show <id> state\|vars\|stack\|breaks\|pc\|code` | inspection |
| `status`, `pool` | engine and pool summaries |
| `compact` | close the gaps in both pools; exports move on the next tick |
| `save <file>`, `load <file>` | CRC-checked configuration blob |

## Status registers

Input registers 200 to 203 hold each program's status bits (0 enabled,
1 compiled, 2 running, 3 error), 204 to 207 execution counts, 208 to 211
error counts, 212 to 215 binding counts and 216 to 219 the last execution
time in microseconds. Exported variables follow from register 220.
*/
